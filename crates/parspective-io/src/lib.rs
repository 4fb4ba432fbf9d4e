//! # Parspective I/O
//!
//! Reading the JSON netlist bundle a diagram is drawn from and writing the
//! finished image as a PNG.

pub mod error;
pub mod netlist_file;
pub mod png;

pub use error::IoError;
pub use netlist_file::{read_netlist, NetlistFile};
pub use self::png::{encode_png, write_png};
