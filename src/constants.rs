// Constants module - centralized default values for configuration
//
// Every tunable default used by the watermark pipeline, the export layer
// and the CLI lives here so the config module and the library agree.

use std::time::Duration;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark text
pub const DEFAULT_TEXT: &str = "公众号琴姐惠生活";

/// Default watermark color (hex, leading '#' optional)
pub const DEFAULT_COLOR: &str = "#000000";

/// Default watermark opacity
pub const DEFAULT_ALPHA: f32 = 0.1;

/// Default rotation of the tile grid in degrees
pub const DEFAULT_ANGLE_DEGREES: f32 = -35.0;

/// Default row spacing multiplier
pub const DEFAULT_SPACING_FACTOR: f32 = 4.0;

/// Default font size multiplier
pub const DEFAULT_SIZE_FACTOR: f32 = 1.5;

// =============================================================================
// Settings panel ranges
// =============================================================================

/// Opacity slider range
pub const ALPHA_RANGE: (f32, f32) = (0.1, 1.0);

/// Angle slider range in degrees
pub const ANGLE_RANGE: (f32, f32) = (-90.0, 90.0);

/// Row spacing slider range
pub const SPACING_RANGE: (f32, f32) = (1.0, 5.0);

/// Font size slider range
pub const SIZE_RANGE: (f32, f32) = (0.5, 3.0);

/// Quiet period before a settings change reaches the compositor
pub const SETTINGS_DEBOUNCE: Duration = Duration::from_millis(150);

// =============================================================================
// Tiling
// =============================================================================

/// Smallest base font size in pixels, before the size multiplier
pub const MIN_BASE_FONT_SIZE: f32 = 15.0;

/// Shorter image side is divided by this to get the base font size
pub const FONT_SIZE_DIVISOR: f32 = 25.0;

/// Wide glyph whose advance is used as the horizontal gutter between tiles
pub const GUTTER_REFERENCE_GLYPH: char = '啊';

/// Fallback gutter glyph for fonts without CJK coverage
pub const GUTTER_FALLBACK_GLYPH: char = 'M';

/// Outline opacity is the fill opacity plus this amount
pub const OUTLINE_ALPHA_BOOST: f32 = 0.2;

/// Outline stroke width relative to the font size
pub const OUTLINE_WIDTH_RATIO: f32 = 0.05;

/// Grids with more tiles than this are not drawn. Settings within the UI
/// ranges stay far below it for any image a browser can decode.
pub const MAX_TILE_COUNT: usize = 1 << 21;

// =============================================================================
// Export defaults
// =============================================================================

/// Prefix prepended to exported file names
pub const DEFAULT_FILE_PREFIX: &str = "watermarked";

/// Extension used when the original name has none
pub const DEFAULT_EXTENSION: &str = "png";

/// MIME type of every exported image
pub const EXPORT_MIME: &str = "image/png";

/// Object URL lifetime after a synthetic download click
pub const DOWNLOAD_RELEASE_DELAY: Duration = Duration::from_millis(100);

/// Object URL lifetime when a viewer may still be displaying it
pub const VIEWER_RELEASE_DELAY: Duration = Duration::from_secs(60);

/// Default output directory for the filesystem host
pub const DEFAULT_OUTPUT_DIR: &str = "watermarked";

// =============================================================================
// Session
// =============================================================================

/// Image types accepted by the session
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

// =============================================================================
// Logging
// =============================================================================

/// Default log level when neither config nor RUST_LOG sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";
