// End-to-end: load an image, composite the watermark, export to disk

use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;
use tilemark::config::Config;
use tilemark::export::{ExportHost, ExportMethod, Exporter, FilesystemHost, RuntimeProbe};
use tilemark::session::ImageSession;
use tilemark::watermark::{
    CompositeSurface, FontRasterizer, GlyphRasterizer, TextMask, TileCompositor, WatermarkSpec,
};

const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";

/// Solid blocks `0.6 * size` wide per character, filling the middle 70%
/// of a mask one `size` tall.
struct BlockGlyphs;

impl GlyphRasterizer for BlockGlyphs {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.6
    }

    fn rasterize(&self, text: &str, font_size: f32) -> TextMask {
        let width = self.measure(text, font_size).ceil() as u32;
        let height = font_size.ceil() as u32;
        let mut mask = TextMask::new(width, height);
        let top = (height as f32 * 0.15) as i32;
        let bottom = (height as f32 * 0.85) as i32;
        for y in top..bottom {
            for x in 0..width as i32 {
                mask.add(x, y, 1.0);
            }
        }
        mask
    }
}

fn write_png(dir: &TempDir, name: &str, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.path().join(name);
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

fn exporter_for(host: &Arc<FilesystemHost>) -> Exporter {
    let dyn_host: Arc<dyn ExportHost> = host.clone();
    Exporter::new(dyn_host)
}

#[tokio::test]
async fn test_watermark_and_download_to_disk() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = write_png(&input_dir, "photo.png", 400, 300);

    let mut session = ImageSession::new();
    session.add_file(&input).await.unwrap();
    let entry = session.selected().unwrap();

    let compositor = TileCompositor::new(Arc::new(BlockGlyphs));
    let spec = WatermarkSpec::new("AB").with_angle(0.0).with_alpha(0.3);
    let mut surface = CompositeSurface::new();
    assert!(compositor.composite(&mut surface, entry.image(), &spec).is_drawn());

    let host = Arc::new(FilesystemHost::new(output_dir.path()));
    let report = exporter_for(&host)
        .export_with_report(&surface, entry.file_name(), None)
        .await;
    assert!(report.success);
    assert_eq!(report.method, Some(ExportMethod::DataUrlDownload));

    let written = output_dir.path().join("watermarked_photo.png");
    let exported = image::open(&written).unwrap().to_rgba8();
    assert_eq!(exported.dimensions(), (400, 300));

    // Tile center: white under 30% black
    let center = exported.get_pixel(200, 150);
    assert_eq!(center, &Rgba([178, 178, 178, 255]));
    assert_eq!(exported, *surface.pixels());
}

#[tokio::test]
async fn test_empty_text_exports_base_image() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let input = write_png(&input_dir, "blank.png", 64, 48);

    let mut session = ImageSession::new();
    session.add_file(&input).await.unwrap();
    let entry = session.selected().unwrap();

    let compositor = TileCompositor::new(Arc::new(BlockGlyphs));
    let mut surface = CompositeSurface::new();
    compositor.composite(&mut surface, entry.image(), &WatermarkSpec::new(""));

    let host = Arc::new(FilesystemHost::new(output_dir.path()));
    assert!(exporter_for(&host).export_surface(&surface, "blank.png", None).await);

    let exported = image::open(output_dir.path().join("watermarked_blank.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(&exported, entry.image().pixels());
}

#[tokio::test]
async fn test_restricted_runtime_writes_viewer_page() {
    let output_dir = TempDir::new().unwrap();
    let source = tilemark::watermark::SourceImage::new(
        RgbaImage::from_pixel(20, 10, Rgba([255, 255, 255, 255])),
        "snap.jpg",
    );
    let compositor = TileCompositor::new(Arc::new(BlockGlyphs));
    let mut surface = CompositeSurface::new();
    compositor.composite(&mut surface, &source, &WatermarkSpec::new("X"));

    let host = Arc::new(FilesystemHost::with_probe(
        output_dir.path(),
        RuntimeProbe::desktop().with_protocol("file:"),
    ));
    let report = exporter_for(&host)
        .export_with_report(&surface, "snap.jpg", None)
        .await;

    assert!(report.success);
    assert_eq!(report.method, Some(ExportMethod::DataUrlViewer));
    let page = std::fs::read_to_string(output_dir.path().join("watermarked_snap.html")).unwrap();
    assert!(page.contains("data:image/png;base64,"));
    assert!(page.contains(r#"download="watermarked_snap.jpg""#));
}

#[tokio::test]
async fn test_mobile_runtime_downloads_through_object_url() {
    let output_dir = TempDir::new().unwrap();
    let source = tilemark::watermark::SourceImage::new(
        RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255])),
        "dark.png",
    );
    let mut surface = CompositeSurface::new();
    TileCompositor::new(Arc::new(BlockGlyphs)).composite(
        &mut surface,
        &source,
        &WatermarkSpec::new("X").with_color("#ffffff"),
    );

    let host = Arc::new(FilesystemHost::with_probe(
        output_dir.path(),
        RuntimeProbe::from_user_agent(IPHONE),
    ));
    let report = exporter_for(&host)
        .export_with_report(&surface, "dark.png", None)
        .await;

    assert_eq!(report.method, Some(ExportMethod::ObjectUrlDownload));
    assert!(output_dir.path().join("watermarked_dark.png").exists());

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(host.live_object_urls(), 0);
}

#[tokio::test]
async fn test_system_font_watermark() {
    let Ok(rasterizer) = FontRasterizer::discover() else {
        return;
    };
    let source = tilemark::watermark::SourceImage::new(
        RgbaImage::from_pixel(400, 300, Rgba([255, 255, 255, 255])),
        "white.png",
    );
    let spec = WatermarkSpec::new("AB").with_angle(0.0).with_alpha(0.3);
    let mut surface = CompositeSurface::new();
    assert!(TileCompositor::new(Arc::new(rasterizer))
        .composite(&mut surface, &source, &spec)
        .is_drawn());

    let darkest = surface.pixels().pixels().map(|p| p[0]).min().unwrap();
    // Never darker than full coverage at 30% opacity
    assert!(darkest >= 177, "darkest channel {}", darkest);
    assert!(darkest < 240, "watermark not visible, darkest channel {}", darkest);
}

#[test]
fn test_config_drives_exporter_naming() {
    let config = Config::from_yaml_with_env("export:\n  file_prefix: \"wm\"\n").unwrap();
    assert_eq!(config.export.file_namer().name_for("a.jpg"), "wm_a.jpg");
}

#[tokio::test]
async fn test_same_named_inputs_export_to_distinct_files() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let mut session = ImageSession::new();
    for (dir, (width, height)) in [(&first_dir, (4, 4)), (&second_dir, (9, 7))] {
        let path = write_png(dir, "photo.png", width, height);
        assert!(session.add_file(&path).await.unwrap().is_some());
    }
    assert_eq!(session.len(), 2);

    let compositor = TileCompositor::new(Arc::new(BlockGlyphs));
    let host = Arc::new(FilesystemHost::new(output_dir.path()));
    let exporter = exporter_for(&host);
    let mut surface = CompositeSurface::new();

    for entry in session.images() {
        compositor.composite(&mut surface, entry.image(), &WatermarkSpec::new("AB"));
        assert!(exporter.export_surface(&surface, entry.file_name(), None).await);
    }

    let first = output_dir.path().join("watermarked_photo.png");
    let second = output_dir.path().join("watermarked_photo_1.png");
    assert_eq!(host.written_files(), vec![first.clone(), second.clone()]);
    assert_eq!(image::open(&first).unwrap().to_rgba8().dimensions(), (4, 4));
    assert_eq!(image::open(&second).unwrap().to_rgba8().dimensions(), (9, 7));
}
