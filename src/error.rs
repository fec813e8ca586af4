// Error types module

use crate::export::ExportError;
use crate::logging::LoggingError;
use crate::session::SessionError;
use crate::watermark::WatermarkError;

/// Crate-level error type
///
/// Compositing and exporting never fail past their entry points; this type
/// covers the setup around them (config, fonts, loading images, logging).
#[derive(Debug, thiserror::Error)]
pub enum TilemarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Watermark(#[from] WatermarkError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TilemarkError>;
