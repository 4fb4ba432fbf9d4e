//! # Parspective CLI
//!
//! Turns a JSON netlist bundle into a PNG diagram, running whichever
//! place-and-route stages are missing through an external command.

pub mod app;
pub mod args;
pub mod backend;
pub mod error;
pub mod machine;
pub mod plan;

pub use app::{prepare, run, Prepared};
pub use args::Cli;
pub use backend::{BackendError, ExternalBackend, ParBackend, ParRequest};
pub use error::CliError;
pub use plan::{Stage, StagePlan};
