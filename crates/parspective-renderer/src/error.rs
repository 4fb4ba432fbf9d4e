use thiserror::Error;

use parspective_core::CoreError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Machine has no live chips to draw")]
    NoLiveChips,

    #[error("Cannot allocate a {width}x{height} pixel image")]
    PixmapAlloc { width: u32, height: u32 },

    #[error("Invalid routing tree: {0}")]
    InvalidRoute(#[from] CoreError),
}
