//! Watermark settings.
//!
//! `WatermarkSpec` is the fully resolved set of parameters handed to the
//! compositor for one pass. It deserializes from the `watermark` section of
//! the YAML config and every field has a default:
//!
//! ```yaml
//! watermark:
//!   text: "Copyright 2025"
//!   color: "#000000"
//!   alpha: 0.1
//!   angle: -35
//!   spacing: 4
//!   size: 1.5
//!   outline: false
//! ```

use serde::{Deserialize, Serialize};

use super::WatermarkError;
use crate::constants::{
    ALPHA_RANGE, ANGLE_RANGE, DEFAULT_ALPHA, DEFAULT_ANGLE_DEGREES, DEFAULT_COLOR,
    DEFAULT_SIZE_FACTOR, DEFAULT_SPACING_FACTOR, DEFAULT_TEXT, SIZE_RANGE, SPACING_RANGE,
};

fn default_text() -> String {
    DEFAULT_TEXT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_alpha() -> f32 {
    DEFAULT_ALPHA
}

fn default_angle() -> f32 {
    DEFAULT_ANGLE_DEGREES
}

fn default_spacing() -> f32 {
    DEFAULT_SPACING_FACTOR
}

fn default_size() -> f32 {
    DEFAULT_SIZE_FACTOR
}

/// Parameters for one tiled watermark pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    /// Text repeated in every tile. Empty text draws nothing.
    #[serde(default = "default_text")]
    pub text: String,

    /// `#RRGGBB` or `RRGGBB`; anything else renders black
    #[serde(default = "default_color", rename = "color")]
    pub color_hex: String,

    /// Opacity from 0.0 to 1.0
    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Rotation of the whole tile grid in degrees
    #[serde(default = "default_angle", rename = "angle")]
    pub angle_degrees: f32,

    /// Row pitch as a multiple of the font size
    #[serde(default = "default_spacing", rename = "spacing")]
    pub spacing_factor: f32,

    /// Font size multiplier relative to the image dimensions
    #[serde(default = "default_size", rename = "size")]
    pub size_factor: f32,

    /// Stroke each tile with a contrasting outline
    #[serde(default)]
    pub outline: bool,
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self {
            text: default_text(),
            color_hex: default_color(),
            alpha: default_alpha(),
            angle_degrees: default_angle(),
            spacing_factor: default_spacing(),
            size_factor: default_size(),
            outline: false,
        }
    }
}

impl WatermarkSpec {
    /// Create settings with the given text and default everything else.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color_hex: impl Into<String>) -> Self {
        self.color_hex = color_hex.into();
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_angle(mut self, angle_degrees: f32) -> Self {
        self.angle_degrees = angle_degrees;
        self
    }

    pub fn with_spacing(mut self, spacing_factor: f32) -> Self {
        self.spacing_factor = spacing_factor;
        self
    }

    pub fn with_size(mut self, size_factor: f32) -> Self {
        self.size_factor = size_factor;
        self
    }

    pub fn with_outline(mut self, outline: bool) -> Self {
        self.outline = outline;
        self
    }

    /// Clamp numeric fields into the ranges offered by the settings panel.
    ///
    /// Non-finite values are replaced by the defaults first.
    pub fn clamp_to_ui_ranges(mut self) -> Self {
        fn clamp(value: f32, fallback: f32, range: (f32, f32)) -> f32 {
            let value = if value.is_finite() { value } else { fallback };
            value.clamp(range.0, range.1)
        }

        self.alpha = clamp(self.alpha, DEFAULT_ALPHA, ALPHA_RANGE);
        self.angle_degrees = clamp(self.angle_degrees, DEFAULT_ANGLE_DEGREES, ANGLE_RANGE);
        self.spacing_factor = clamp(self.spacing_factor, DEFAULT_SPACING_FACTOR, SPACING_RANGE);
        self.size_factor = clamp(self.size_factor, DEFAULT_SIZE_FACTOR, SIZE_RANGE);
        self
    }

    /// Whether the multipliers describe a finite, non-empty grid.
    pub fn has_drawable_geometry(&self) -> bool {
        self.spacing_factor.is_finite()
            && self.spacing_factor > 0.0
            && self.size_factor.is_finite()
            && self.size_factor > 0.0
            && self.angle_degrees.is_finite()
    }

    /// Validate the settings as loaded from configuration.
    ///
    /// Empty text and malformed colors are accepted: both have defined
    /// rendering behavior.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(WatermarkError::ConfigError(format!(
                "alpha must be a finite value between 0.0 and 1.0, got {}",
                self.alpha
            )));
        }

        if !self.angle_degrees.is_finite() {
            return Err(WatermarkError::ConfigError(format!(
                "angle must be finite, got {}",
                self.angle_degrees
            )));
        }

        // Smaller multipliers grow the tile grid quadratically
        if !(SPACING_RANGE.0..=SPACING_RANGE.1).contains(&self.spacing_factor) {
            return Err(WatermarkError::ConfigError(format!(
                "spacing must be between {} and {}, got {}",
                SPACING_RANGE.0, SPACING_RANGE.1, self.spacing_factor
            )));
        }

        if !(SIZE_RANGE.0..=SIZE_RANGE.1).contains(&self.size_factor) {
            return Err(WatermarkError::ConfigError(format!(
                "size must be between {} and {}, got {}",
                SIZE_RANGE.0, SIZE_RANGE.1, self.size_factor
            )));
        }

        Ok(())
    }
}
