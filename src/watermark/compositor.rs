//! Tiled watermark compositor.
//!
//! Draws a source image onto a surface and overlays a rotated grid of
//! repeated text.
//!
//! # Algorithm
//!
//! 1. Reset the surface to the source dimensions and copy the base layer.
//! 2. Derive the font size from the shorter image side and measure the text
//!    plus a wide reference glyph used as the gutter between tiles.
//! 3. Size a tile grid from the image diagonal (see [`TileGrid`]).
//! 4. Rasterize the text once and stamp it at every tile center through the
//!    inverse rotation, blending with the Porter-Duff "over" operator.
//!
//! Invalid input (empty text, zero-width text, degenerate multipliers)
//! leaves the surface holding the base image only. Compositing never fails.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::{CompositeSurface, SourceImage, TileCompositor, WatermarkSpec};
//!
//! let compositor = TileCompositor::new(Arc::new(FontRasterizer::load(None)?));
//! let mut surface = CompositeSurface::new();
//! compositor.composite(&mut surface, &source, &WatermarkSpec::new("Sample"));
//! ```

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;

use super::color::{Color, FillStyle};
use super::text_renderer::{GlyphRasterizer, TextMask};
use super::tiling::{font_size_for, TileGrid};
use super::WatermarkSpec;
use crate::constants::{
    GUTTER_FALLBACK_GLYPH, GUTTER_REFERENCE_GLYPH, MAX_TILE_COUNT, OUTLINE_ALPHA_BOOST,
    OUTLINE_WIDTH_RATIO,
};

/// A decoded input image. Never modified by compositing.
#[derive(Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
    file_name: String,
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("file_name", &self.file_name)
            .field("dimensions", &(self.pixels.width(), self.pixels.height()))
            .finish()
    }
}

impl SourceImage {
    pub fn new(pixels: RgbaImage, file_name: impl Into<String>) -> Self {
        Self {
            pixels,
            file_name: file_name.into(),
        }
    }

    pub fn from_dynamic(image: &DynamicImage, file_name: impl Into<String>) -> Self {
        Self::new(image.to_rgba8(), file_name)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Name of the file the image was loaded from.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Drawing target for one composite pass.
///
/// Fully overwritten by every call to [`TileCompositor::composite`].
#[derive(Debug, Clone)]
pub struct CompositeSurface {
    pixels: RgbaImage,
}

impl Default for CompositeSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeSurface {
    /// Create an empty 0x0 surface.
    pub fn new() -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
        }
    }

    /// Resize to the source dimensions and draw the source at the origin.
    pub fn reset_to(&mut self, source: &SourceImage) {
        self.pixels.clone_from(source.pixels());
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

/// Why a pass drew no tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Watermark text is empty
    EmptyText,
    /// Text measured to zero width
    ZeroTextWidth,
    /// Spacing or size is not a finite positive number, or the angle is not finite
    DegenerateGeometry,
    /// The grid holds more than `MAX_TILE_COUNT` tiles
    TooManyTiles,
}

/// Result of a composite pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompositeOutcome {
    /// Only the base image was drawn
    Skipped(SkipReason),
    /// Tiles were drawn
    Drawn {
        /// Tiles in the grid, including ones culled for lying off-surface
        tiles: usize,
        /// Tiles that intersected the surface
        visible: usize,
        /// Resolved font size in pixels
        font_size: f32,
    },
}

impl CompositeOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, Self::Drawn { .. })
    }
}

/// Composites tiled text watermarks using a shared font backend.
#[derive(Clone)]
pub struct TileCompositor {
    rasterizer: Arc<dyn GlyphRasterizer>,
}

impl std::fmt::Debug for TileCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCompositor").finish_non_exhaustive()
    }
}

impl TileCompositor {
    pub fn new(rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Reset `surface` to `source` and overlay the tiled watermark.
    pub fn composite(
        &self,
        surface: &mut CompositeSurface,
        source: &SourceImage,
        spec: &WatermarkSpec,
    ) -> CompositeOutcome {
        composite(surface, source, spec, self.rasterizer.as_ref())
    }
}

/// A rasterized layer drawn at every tile.
struct StampLayer {
    mask: TextMask,
    color: Color,
    alpha: f32,
}

/// A tile center in surface space with its clipped bounding box.
struct Placement {
    /// Tile center in the rotated grid frame
    offset: (f32, f32),
    x_range: (u32, u32),
    y_range: (u32, u32),
}

/// Reset `surface` to `source` and overlay the tiled watermark.
pub fn composite(
    surface: &mut CompositeSurface,
    source: &SourceImage,
    spec: &WatermarkSpec,
    rasterizer: &dyn GlyphRasterizer,
) -> CompositeOutcome {
    surface.reset_to(source);

    if spec.text.is_empty() {
        return CompositeOutcome::Skipped(SkipReason::EmptyText);
    }

    if !spec.has_drawable_geometry() {
        tracing::warn!(
            spacing = spec.spacing_factor,
            size = spec.size_factor,
            angle = spec.angle_degrees,
            "Degenerate watermark geometry, drawing base image only"
        );
        return CompositeOutcome::Skipped(SkipReason::DegenerateGeometry);
    }

    let (width, height) = (surface.width(), surface.height());
    let font_size = font_size_for(width, height, spec.size_factor);

    let text_width = rasterizer.measure(&spec.text, font_size);
    if !(text_width > 0.0) {
        return CompositeOutcome::Skipped(SkipReason::ZeroTextWidth);
    }

    let margin = gutter_width(rasterizer, font_size);
    let Some(grid) = TileGrid::compute(
        width,
        height,
        text_width,
        margin,
        font_size,
        spec.spacing_factor,
    ) else {
        return CompositeOutcome::Skipped(SkipReason::DegenerateGeometry);
    };

    if grid.tile_count() > MAX_TILE_COUNT {
        tracing::warn!(
            tiles = grid.tile_count(),
            max = MAX_TILE_COUNT,
            spacing = spec.spacing_factor,
            size = spec.size_factor,
            "Watermark grid too dense, drawing base image only"
        );
        return CompositeOutcome::Skipped(SkipReason::TooManyTiles);
    }

    let mask = rasterizer.rasterize(&spec.text, font_size);
    if mask.width() == 0 || mask.height() == 0 {
        return CompositeOutcome::Skipped(SkipReason::ZeroTextWidth);
    }

    let fill = FillStyle::resolve(&spec.color_hex, spec.alpha);
    let mut layers = Vec::with_capacity(2);
    if spec.outline {
        let stroke = fill.outline(OUTLINE_ALPHA_BOOST);
        let ring = mask.outline(font_size * OUTLINE_WIDTH_RATIO);
        layers.push(StampLayer {
            mask,
            color: fill.color,
            alpha: fill.coverage_alpha(),
        });
        layers.push(StampLayer {
            mask: ring,
            color: stroke.color,
            alpha: stroke.coverage_alpha(),
        });
    } else {
        layers.push(StampLayer {
            mask,
            color: fill.color,
            alpha: fill.coverage_alpha(),
        });
    }

    let (sin, cos) = spec.angle_degrees.to_radians().sin_cos();
    let placements = place_tiles(&grid, &layers[0].mask, width, height, sin, cos);

    tracing::debug!(
        width,
        height,
        font_size,
        text_width,
        margin,
        x_count = grid.x_count,
        y_count = grid.y_count,
        visible = placements.len(),
        "Compositing tiled watermark"
    );

    stamp(surface, &placements, &layers, sin, cos);

    CompositeOutcome::Drawn {
        tiles: grid.tile_count(),
        visible: placements.len(),
        font_size,
    }
}

/// Advance of the wide reference glyph, or the Latin fallback when the
/// font lacks it.
fn gutter_width(rasterizer: &dyn GlyphRasterizer, font_size: f32) -> f32 {
    let mut buf = [0u8; 4];
    if rasterizer.has_glyph(GUTTER_REFERENCE_GLYPH) {
        let width = rasterizer.measure(GUTTER_REFERENCE_GLYPH.encode_utf8(&mut buf), font_size);
        if width > 0.0 {
            return width;
        }
    }
    rasterizer
        .measure(GUTTER_FALLBACK_GLYPH.encode_utf8(&mut buf), font_size)
        .max(0.0)
}

/// Surface-space bounding boxes of every tile that can touch the surface,
/// in drawing order.
fn place_tiles(
    grid: &TileGrid,
    mask: &TextMask,
    width: u32,
    height: u32,
    sin: f32,
    cos: f32,
) -> Vec<Placement> {
    let (mw, mh) = (mask.width() as f32, mask.height() as f32);
    // Radius of the circle enclosing the mask at any rotation
    let radius = (mw * mw + mh * mh).sqrt() / 2.0 + 1.0;
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);

    grid.offsets()
        .filter_map(|offset| {
            let px = cx + offset.x * cos - offset.y * sin;
            let py = cy + offset.x * sin + offset.y * cos;

            let x0 = (px - radius).floor().max(0.0);
            let y0 = (py - radius).floor().max(0.0);
            let x1 = (px + radius).ceil().min(width as f32 - 1.0);
            let y1 = (py + radius).ceil().min(height as f32 - 1.0);
            if x0 > x1 || y0 > y1 {
                return None;
            }

            Some(Placement {
                offset: (offset.x, offset.y),
                x_range: (x0 as u32, x1 as u32),
                y_range: (y0 as u32, y1 as u32),
            })
        })
        .collect()
}

/// Blend every layer of every placement into the surface.
///
/// Rows are processed in parallel; within a pixel, tiles and layers are
/// blended in drawing order so the output is deterministic.
fn stamp(
    surface: &mut CompositeSurface,
    placements: &[Placement],
    layers: &[StampLayer],
    sin: f32,
    cos: f32,
) {
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return;
    }
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let row_len = width as usize * 4;

    let pixels: &mut [u8] = &mut surface.pixels;
    pixels
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            let dy = y as f32 + 0.5 - cy;

            for placement in placements {
                if y < placement.y_range.0 || y > placement.y_range.1 {
                    continue;
                }
                for x in placement.x_range.0..=placement.x_range.1 {
                    let dx = x as f32 + 0.5 - cx;
                    // Inverse rotation into the grid frame, then into the tile
                    let u = dx * cos + dy * sin - placement.offset.0;
                    let v = -dx * sin + dy * cos - placement.offset.1;

                    let idx = x as usize * 4;
                    let px = &mut row[idx..idx + 4];
                    for layer in layers {
                        let (mx, my) = layer.mask.center();
                        let coverage = layer.mask.sample(u + mx, v + my);
                        let alpha = coverage * layer.alpha;
                        if alpha > 0.0 {
                            blend_over(px, layer.color, alpha);
                        }
                    }
                }
            }
        });
}

/// Porter-Duff "over" of a solid color at `alpha` onto an RGBA pixel.
fn blend_over(dst: &mut [u8], color: Color, alpha: f32) {
    let fg_alpha = alpha.clamp(0.0, 1.0);
    let bg_alpha = dst[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).clamp(0.0, 255.0) as u8
    };

    dst[0] = blend_channel(color.r, dst[0]);
    dst[1] = blend_channel(color.g, dst[1]);
    dst[2] = blend_channel(color.b, dst[2]);
    dst[3] = (out_alpha * 255.0) as u8;
}
