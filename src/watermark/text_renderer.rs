//! Text watermark rasterization.
//!
//! Text is rendered once per compositing pass into a single-channel
//! coverage mask, which the compositor then stamps at every tile position.
//!
//! # Features
//!
//! - `GlyphRasterizer` trait so the compositor can be driven by any font
//!   backend
//! - `FontRasterizer` backed by `ab_glyph`, loaded from an explicit path or
//!   discovered among common system font locations
//! - Outline ring masks for the contrasting stroke mode
//!
//! # Example
//!
//! ```ignore
//! use tilemark::watermark::text_renderer::{FontRasterizer, GlyphRasterizer};
//!
//! let fonts = FontRasterizer::load(None)?;
//! let width = fonts.measure("Copyright", 24.0);
//! let mask = fonts.rasterize("Copyright", 24.0);
//! ```

use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};

use super::WatermarkError;

/// Well-known font locations probed when no font path is configured.
///
/// Bold sans faces come first; CJK collections are listed before the Latin
/// fallbacks so the default text renders without tofu when available.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "C:\\Windows\\Fonts\\msyhbd.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Single-channel coverage mask for a line of text.
///
/// The text is centered on the mask center both horizontally and on the
/// middle of the em box vertically.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMask {
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl TextMask {
    /// Create a fully transparent mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Center of the mask in mask pixel coordinates.
    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Whether the mask has no visible coverage.
    pub fn is_blank(&self) -> bool {
        self.coverage.iter().all(|&c| c <= 0.0)
    }

    /// Coverage at an integer pixel, zero outside the mask.
    pub fn get(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return 0.0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Accumulate coverage at a pixel, saturating at 1.0.
    pub fn add(&mut self, x: i32, y: i32, amount: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.coverage[idx] = (self.coverage[idx] + amount).min(1.0);
    }

    /// Bilinear sample at a continuous position.
    ///
    /// Pixel `(x, y)` covers `[x, x+1) x [y, y+1)`, so its value is taken at
    /// `(x + 0.5, y + 0.5)`.
    pub fn sample(&self, fx: f32, fy: f32) -> f32 {
        let sx = fx - 0.5;
        let sy = fy - 0.5;
        let x0 = sx.floor();
        let y0 = sy.floor();
        let tx = sx - x0;
        let ty = sy - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let c00 = self.get(x0, y0);
        let c10 = self.get(x0 + 1, y0);
        let c01 = self.get(x0, y0 + 1);
        let c11 = self.get(x0 + 1, y0 + 1);

        c00 * (1.0 - tx) * (1.0 - ty) + c10 * tx * (1.0 - ty) + c01 * (1.0 - tx) * ty + c11 * tx * ty
    }

    /// Ring mask tracing the glyph edges with the given stroke width.
    ///
    /// Computed as dilation minus erosion with a square window of half the
    /// stroke width, so the stroke straddles the glyph boundary.
    pub fn outline(&self, stroke_width: f32) -> TextMask {
        let radius = ((stroke_width / 2.0).ceil() as i32).max(1);
        let dilated = self.morph(radius, f32::max, 0.0);
        let eroded = self.morph(radius, f32::min, 1.0);

        let coverage = dilated
            .coverage
            .iter()
            .zip(&eroded.coverage)
            .map(|(d, e)| (d - e).clamp(0.0, 1.0))
            .collect();

        TextMask {
            width: self.width,
            height: self.height,
            coverage,
        }
    }

    /// Separable min/max filter. Pixels outside the mask count as zero.
    fn morph(&self, radius: i32, pick: fn(f32, f32) -> f32, identity: f32) -> TextMask {
        let (w, h) = (self.width as i32, self.height as i32);
        let mut rows = TextMask::new(self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                let v = (x - radius..=x + radius).fold(identity, |acc, sx| pick(acc, self.get(sx, y)));
                rows.coverage[(y * w + x) as usize] = v;
            }
        }

        let mut out = TextMask::new(self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                let v = (y - radius..=y + radius).fold(identity, |acc, sy| pick(acc, rows.get(x, sy)));
                out.coverage[(y * w + x) as usize] = v;
            }
        }
        out
    }
}

/// A font backend able to measure and rasterize a line of text.
pub trait GlyphRasterizer: Send + Sync {
    /// Advance width of `text` in pixels at `font_size`.
    fn measure(&self, text: &str, font_size: f32) -> f32;

    /// Render `text` centered into a coverage mask.
    fn rasterize(&self, text: &str, font_size: f32) -> TextMask;

    /// Whether the backend has a real glyph for `c`.
    fn has_glyph(&self, _c: char) -> bool {
        true
    }
}

/// `ab_glyph` font backend.
pub struct FontRasterizer {
    font: FontVec,
    source: PathBuf,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("source", &self.source)
            .finish()
    }
}

impl FontRasterizer {
    /// Load from an explicit path, or discover a system font when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, WatermarkError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::discover(),
        }
    }

    /// Load a TrueType/OpenType font or the first face of a collection.
    pub fn from_path(path: &Path) -> Result<Self, WatermarkError> {
        let data = std::fs::read(path)
            .map_err(|e| WatermarkError::FontError(format!("{}: {}", path.display(), e)))?;
        let font = FontVec::try_from_vec_and_index(data, 0)
            .map_err(|e| WatermarkError::FontError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(font = %path.display(), "Loaded watermark font");
        Ok(Self {
            font,
            source: path.to_path_buf(),
        })
    }

    /// Probe well-known system font locations.
    pub fn discover() -> Result<Self, WatermarkError> {
        for candidate in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(candidate);
            if !path.is_file() {
                continue;
            }
            match Self::from_path(path) {
                Ok(font) => return Ok(font),
                Err(e) => tracing::debug!(error = %e, "Skipping unusable system font"),
            }
        }

        Err(WatermarkError::FontError(
            "no usable system font found; set font.path in the configuration".to_string(),
        ))
    }

    /// Path the font was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(font_size));

        let mut width = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                width += scaled.kern(prev, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            prev = Some(glyph_id);
        }
        width
    }

    fn rasterize(&self, text: &str, font_size: f32) -> TextMask {
        let scale = PxScale::from(font_size);
        let scaled = self.font.as_scaled(scale);
        let advance = self.measure(text, font_size);
        if text.is_empty() || advance <= 0.0 {
            return TextMask::new(0, 0);
        }

        // Room for side bearings, overhangs and a later outline stroke
        let pad = (font_size * 0.25).ceil() + 1.0;
        let ascent = scaled.ascent();
        let descent = scaled.descent();
        let width = (advance.ceil() + 2.0 * pad) as u32;
        let height = ((ascent - descent).ceil() + 2.0 * pad) as u32;
        let mut mask = TextMask::new(width, height);

        // Middle of the em box sits on the mask center
        let baseline = height as f32 / 2.0 + (ascent + descent) / 2.0;
        let mut cursor_x = (width as f32 - advance) / 2.0;
        let mut prev: Option<GlyphId> = None;

        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                cursor_x += scaled.kern(prev, glyph_id);
            }

            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|px, py, coverage| {
                    let x = px as i32 + bounds.min.x as i32;
                    let y = py as i32 + bounds.min.y as i32;
                    mask.add(x, y, coverage);
                });
            }

            cursor_x += scaled.h_advance(glyph_id);
            prev = Some(glyph_id);
        }

        mask
    }

    fn has_glyph(&self, c: char) -> bool {
        self.font.glyph_id(c).0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_mask(width: u32, height: u32, block: (i32, i32, i32, i32)) -> TextMask {
        let mut mask = TextMask::new(width, height);
        for y in block.1..block.3 {
            for x in block.0..block.2 {
                mask.add(x, y, 1.0);
            }
        }
        mask
    }

    #[test]
    fn test_mask_get_outside_is_zero() {
        let mask = solid_mask(4, 4, (0, 0, 4, 4));
        assert_eq!(mask.get(-1, 0), 0.0);
        assert_eq!(mask.get(0, 4), 0.0);
        assert_eq!(mask.get(2, 2), 1.0);
    }

    #[test]
    fn test_mask_add_saturates() {
        let mut mask = TextMask::new(2, 2);
        mask.add(0, 0, 0.7);
        mask.add(0, 0, 0.7);
        assert_eq!(mask.get(0, 0), 1.0);
        // Out of bounds writes are ignored
        mask.add(5, 5, 1.0);
    }

    #[test]
    fn test_sample_at_pixel_center_is_exact() {
        let mut mask = TextMask::new(3, 3);
        mask.add(1, 1, 0.5);
        assert!((mask.sample(1.5, 1.5) - 0.5).abs() < 1e-6);
        assert_eq!(mask.sample(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_sample_interpolates() {
        let mask = solid_mask(4, 1, (2, 0, 4, 1));
        // Halfway between pixel 1 (0.0) and pixel 2 (1.0)
        assert!((mask.sample(2.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_center() {
        let mask = TextMask::new(10, 6);
        assert_eq!(mask.center(), (5.0, 3.0));
    }

    #[test]
    fn test_is_blank() {
        assert!(TextMask::new(3, 3).is_blank());
        assert!(!solid_mask(3, 3, (1, 1, 2, 2)).is_blank());
    }

    #[test]
    fn test_outline_is_a_ring() {
        let mask = solid_mask(20, 20, (5, 5, 15, 15));
        let ring = mask.outline(2.0);

        // Deep inside and far outside are untouched
        assert_eq!(ring.get(10, 10), 0.0);
        assert_eq!(ring.get(1, 1), 0.0);
        // Both sides of the boundary are stroked
        assert_eq!(ring.get(5, 10), 1.0);
        assert_eq!(ring.get(4, 10), 1.0);
    }

    #[test]
    fn test_font_rasterizer_missing_path() {
        let err = FontRasterizer::from_path(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, WatermarkError::FontError(_)));
    }

    #[test]
    fn test_font_rasterizer_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(FontRasterizer::from_path(&path).is_err());
    }

    // Tests below need a real font and are skipped when none is installed

    #[test]
    fn test_system_font_measure_scales() {
        let Ok(fonts) = FontRasterizer::discover() else {
            return;
        };
        let small = fonts.measure("Hello", 12.0);
        let large = fonts.measure("Hello", 48.0);
        assert!(small > 0.0);
        assert!(large > small * 3.0);
        assert_eq!(fonts.measure("", 24.0), 0.0);
    }

    #[test]
    fn test_system_font_rasterize_has_coverage() {
        let Ok(fonts) = FontRasterizer::discover() else {
            return;
        };
        let mask = fonts.rasterize("Hello", 24.0);
        assert!(mask.width() as f32 >= fonts.measure("Hello", 24.0));
        assert!(!mask.is_blank());
    }

    #[test]
    fn test_system_font_rasterize_empty_text() {
        let Ok(fonts) = FontRasterizer::discover() else {
            return;
        };
        let mask = fonts.rasterize("", 24.0);
        assert_eq!((mask.width(), mask.height()), (0, 0));
    }
}
