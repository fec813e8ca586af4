// Tilemark library: tiled text watermarks and capability-aware export

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod logging;
pub mod session;
pub mod watermark;

pub use error::{Result, TilemarkError};
