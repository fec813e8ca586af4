//! Tiled text watermarking.
//!
//! Overlays a rotated, evenly spaced grid of repeated, semi-transparent text
//! onto an image. The grid is sized from the image diagonal so that no
//! rotation angle leaves a corner uncovered.
//!
//! # Features
//!
//! - **Tile grid** geometry independent of any font backend
//! - **Font backends** behind the `GlyphRasterizer` trait (`ab_glyph` by default)
//! - **Color resolution** from 6-digit hex with a black fallback
//! - **Outline mode** stroking every tile in the complementary color
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   text: "Copyright 2025"
//!   color: "#ffffff"
//!   alpha: 0.3
//!   angle: -35
//!   spacing: 4
//!   size: 1.5
//!   outline: true
//! ```

pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod text_renderer;
pub mod tiling;

// Re-export main types for convenience
pub use color::{make_rgba_style, parse_hex_color, Color, FillStyle};
pub use compositor::{
    composite, CompositeOutcome, CompositeSurface, SkipReason, SourceImage, TileCompositor,
};
pub use config::WatermarkSpec;
pub use error::WatermarkError;
pub use text_renderer::{FontRasterizer, GlyphRasterizer, TextMask};
pub use tiling::{font_size_for, to_grid_frame, TileGrid, TileOffset};
