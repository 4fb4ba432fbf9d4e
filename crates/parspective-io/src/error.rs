use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Cannot write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("'{}' is empty", .0.display())]
    Empty(PathBuf),

    #[error("Invalid netlist in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("'{}' must contain a JSON object", .0.display())]
    NotAnObject(PathBuf),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}
