use std::io;
use std::path::PathBuf;

use thiserror::Error;

use parspective_core::CoreError;
use parspective_io::IoError;
use parspective_renderer::RenderError;

use crate::backend::BackendError;
use crate::plan::Stage;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Cannot read config '{}': {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Invalid config '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("The netlist needs {stage} but no place-and-route command was given (see --par-command)")]
    NoBackend { stage: Stage },
}
