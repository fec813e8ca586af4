//! Watermark fill color resolution.
//!
//! Colors arrive as 6-digit hex strings with an optional leading `#`.
//! Anything else resolves to black; a malformed color is never an error.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

static HEX_COLOR: OnceLock<Regex> = OnceLock::new();

fn hex_color_pattern() -> &'static Regex {
    HEX_COLOR.get_or_init(|| {
        Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
            .expect("hex color pattern is valid")
    })
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Per-channel 255-complement, used for the contrasting outline.
    pub fn complement(&self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }
}

/// Parse a strict `#RRGGBB` / `RRGGBB` string.
///
/// Returns `None` for any other shape, including the short `#RGB` form.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let caps = hex_color_pattern().captures(hex)?;
    let channel = |idx: usize| u8::from_str_radix(&caps[idx], 16).ok();
    Some(Color::new(channel(1)?, channel(2)?, channel(3)?))
}

/// A resolved fill: color plus opacity.
///
/// `Display` renders the CSS form `rgba(r,g,b,alpha)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub alpha: f32,
}

impl FillStyle {
    /// Resolve a hex string and opacity, falling back to black.
    pub fn resolve(color_hex: &str, alpha: f32) -> Self {
        let color = parse_hex_color(color_hex).unwrap_or_else(|| {
            tracing::debug!(color = %color_hex, "Unparseable watermark color, using black");
            Color::black()
        });
        Self { color, alpha }
    }

    /// The contrasting outline style for this fill.
    pub fn outline(&self, alpha_boost: f32) -> Self {
        Self {
            color: self.color.complement(),
            alpha: (self.alpha + alpha_boost).min(1.0),
        }
    }

    /// Opacity as a blend factor in `[0, 1]`.
    pub fn coverage_alpha(&self) -> f32 {
        if self.alpha.is_finite() {
            self.alpha.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({},{},{},{})",
            self.color.r, self.color.g, self.color.b, self.alpha
        )
    }
}

/// String form of [`FillStyle::resolve`].
pub fn make_rgba_style(color_hex: &str, alpha: f32) -> String {
    FillStyle::resolve(color_hex, alpha).to_string()
}
