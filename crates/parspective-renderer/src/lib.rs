//! # Parspective Renderer
//!
//! Lays out a SpiNNaker machine as a grid of hexagonal chips and rasterises
//! place-and-route results onto it with tiny-skia: cores coloured by owner,
//! chip-to-chip links, and nets drawn either along their routes or as a
//! ratsnest.
//!
//! All geometry is in hexagon widths; a [`Viewport`] scales the finished
//! diagram to fit the output image.

pub mod config;
pub mod core_map;
pub mod diagram;
pub mod error;
pub mod layout;
pub mod link_nets;
pub mod style;
pub mod viewport;

pub use config::DiagramConfig;
pub use core_map::CoreMap;
pub use diagram::{Diagram, DiagramData, DiagramStyles};
pub use error::RenderError;
pub use layout::Layout;
pub use style::{
    ChipStyle, CoreOwner, CoreStyle, LinkStyle, NetStyle, PolygonStyle, Rgba, Style,
    StyleOverride,
};
pub use viewport::Viewport;
