//! Watermark error types.
//!
//! Defines errors that can occur while preparing a watermark. Compositing
//! itself never fails; these surface from font loading and settings
//! validation only.

use std::fmt;

/// Errors that can occur during watermark preparation.
#[derive(Debug)]
pub enum WatermarkError {
    /// No usable font could be loaded
    FontError(String),

    /// Invalid watermark settings
    ConfigError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontError(msg) => write!(f, "Failed to load font: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
