//! Tile grid geometry for rotated watermarks.
//!
//! The grid is laid out in a rotated frame whose origin is the image
//! center. Its half-extent is sized from the image diagonal rather than
//! the image sides, so after rotation by any angle the four corners of the
//! image still fall inside the grid.
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::tiling::{font_size_for, TileGrid};
//!
//! let font_size = font_size_for(400, 300, 1.0); // 15.0
//! let grid = TileGrid::compute(400, 300, 30.0, 15.0, font_size, 4.0).unwrap();
//! assert!(grid.covers_diagonal());
//! ```

use crate::constants::{FONT_SIZE_DIVISOR, MIN_BASE_FONT_SIZE};

/// Font size in pixels for an image of the given dimensions.
///
/// `size_factor * max(15, min(width, height) / 25)`
pub fn font_size_for(width: u32, height: u32, size_factor: f32) -> f32 {
    let shorter = width.min(height) as f32;
    size_factor * MIN_BASE_FONT_SIZE.max(shorter / FONT_SIZE_DIVISOR)
}

/// One tile position in the rotated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileOffset {
    /// Column index, `-x_count..=x_count`
    pub i: i32,
    /// Row index, `-y_count..=y_count`
    pub j: i32,
    /// Horizontal offset of the tile center from the grid origin
    pub x: f32,
    /// Vertical offset of the tile center from the grid origin
    pub y: f32,
}

/// The set of tiles needed to cover an image at any rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    /// Length of the image diagonal
    pub diagonal: f32,
    /// Distance between adjacent tile centers along a row
    pub step_x: f32,
    /// Distance between adjacent rows
    pub step_y: f32,
    /// Tiles on each side of the origin along a row
    pub x_count: u32,
    /// Rows on each side of the origin
    pub y_count: u32,
}

impl TileGrid {
    /// Compute the grid for an image.
    ///
    /// Returns `None` when either step is not a finite positive length, which
    /// would otherwise produce an unbounded grid.
    pub fn compute(
        width: u32,
        height: u32,
        text_width: f32,
        margin: f32,
        font_size: f32,
        spacing_factor: f32,
    ) -> Option<Self> {
        let step_x = text_width + margin;
        let step_y = spacing_factor * font_size;
        if !step_x.is_finite() || step_x <= 0.0 || !step_y.is_finite() || step_y <= 0.0 {
            return None;
        }

        let (w, h) = (width as f32, height as f32);
        let diagonal = (w * w + h * h).sqrt();
        let x_count = (diagonal / step_x).ceil() as u32;
        let y_count = (diagonal / step_y / 2.0).ceil() as u32;

        Some(Self {
            diagonal,
            step_x,
            step_y,
            x_count,
            y_count,
        })
    }

    /// Total number of tiles, including the origin tile. Saturates instead
    /// of overflowing.
    pub fn tile_count(&self) -> usize {
        let columns = (self.x_count as usize).saturating_mul(2).saturating_add(1);
        let rows = (self.y_count as usize).saturating_mul(2).saturating_add(1);
        columns.saturating_mul(rows)
    }

    /// Half-width and half-height of the area spanned by tile centers.
    pub fn half_extent(&self) -> (f32, f32) {
        (
            self.x_count as f32 * self.step_x,
            self.y_count as f32 * self.step_y,
        )
    }

    /// Whether the grid spans at least one diagonal in both axes.
    pub fn covers_diagonal(&self) -> bool {
        let (half_w, half_h) = self.half_extent();
        2.0 * half_w >= self.diagonal && 2.0 * half_h >= self.diagonal
    }

    /// Whether a point given in the rotated frame lies inside the grid span.
    pub fn contains(&self, u: f32, v: f32) -> bool {
        let (half_w, half_h) = self.half_extent();
        u.abs() <= half_w && v.abs() <= half_h
    }

    /// Tile offsets in drawing order.
    ///
    /// Row-major over every `(i, j)` except the origin, then the origin tile
    /// last. Each tile appears exactly once.
    pub fn offsets(&self) -> impl Iterator<Item = TileOffset> + '_ {
        let x = self.x_count as i32;
        let y = self.y_count as i32;

        (-x..=x)
            .flat_map(move |i| (-y..=y).map(move |j| (i, j)))
            .filter(|&(i, j)| i != 0 || j != 0)
            .chain(std::iter::once((0, 0)))
            .map(move |(i, j)| TileOffset {
                i,
                j,
                x: self.step_x * i as f32,
                y: self.step_y * j as f32,
            })
    }
}

/// Map an image-space point into the rotated grid frame.
///
/// The grid frame is the image frame translated to the center and rotated
/// by `angle_degrees`; this applies the inverse of that transform.
pub fn to_grid_frame(px: f32, py: f32, width: u32, height: u32, angle_degrees: f32) -> (f32, f32) {
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let dx = px - width as f32 / 2.0;
    let dy = py - height as f32 / 2.0;
    (dx * cos + dy * sin, -dx * sin + dy * cos)
}
