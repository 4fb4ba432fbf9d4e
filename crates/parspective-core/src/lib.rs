//! # Parspective Core
//!
//! The data model shared by every part of Parspective: SpiNNaker machine
//! topology, netlists and constraints, place-and-route solutions (placements,
//! allocations and routing trees) and the hexagonal geometry helpers used to
//! draw them.
//!
//! Placement, allocation and routing algorithms live elsewhere; this crate
//! only describes their inputs and results.

pub mod error;
pub mod geometry;
pub mod machine;
pub mod netlist;
pub mod solution;

pub use error::CoreError;
pub use geometry::{BBox, Point};
pub use machine::{ChipXY, Link, Machine, Resources, DEFAULT_CORE_RESOURCE};
pub use netlist::{Constraint, ConstraintId, Net, NetId, ResourceRange, VertexId, VerticesResources};
pub use solution::{Allocations, Placements, Route, RouteTarget, RoutingChild, RoutingTree, Routes};
