use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tilemark::config::Config;
use tilemark::export::{ExportHost, Exporter, FilesystemHost};
use tilemark::session::ImageSession;
use tilemark::watermark::{CompositeSurface, FontRasterizer, TileCompositor};

/// Tilemark - tile a rotated text watermark across images
#[derive(Parser, Debug)]
#[command(name = "tilemark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Images to watermark (png, jpg, gif)
    #[arg(required_unless_present = "test")]
    images: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long)]
    text: Option<String>,

    /// Text color as 6-digit hex, e.g. "#ff0000"
    #[arg(long)]
    color: Option<String>,

    /// Opacity (0.0 - 1.0)
    #[arg(long)]
    alpha: Option<f32>,

    /// Rotation in degrees
    #[arg(long, allow_negative_numbers = true)]
    angle: Option<f32>,

    /// Row spacing multiplier
    #[arg(long)]
    spacing: Option<f32>,

    /// Font size multiplier
    #[arg(long)]
    size: Option<f32>,

    /// Stroke each tile in the complementary color
    #[arg(long)]
    outline: bool,

    /// Font file to render with
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Append a timestamp to exported file names
    #[arg(long)]
    timestamped: bool,

    /// User agent reported to the export strategy, e.g. a mobile browser's
    #[arg(long)]
    user_agent: Option<String>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        let spec = &mut config.watermark;
        if let Some(text) = &self.text {
            spec.text = text.clone();
        }
        if let Some(color) = &self.color {
            spec.color_hex = color.clone();
        }
        if let Some(alpha) = self.alpha {
            spec.alpha = alpha;
        }
        if let Some(angle) = self.angle {
            spec.angle_degrees = angle;
        }
        if let Some(spacing) = self.spacing {
            spec.spacing_factor = spacing;
        }
        if let Some(size) = self.size {
            spec.size_factor = size;
        }
        spec.outline |= self.outline;

        if let Some(font) = &self.font {
            config.font.path = Some(font.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.export.output_dir = dir.clone();
        }
        config.export.timestamped |= self.timestamped;
        if let Some(user_agent) = &self.user_agent {
            config.export.set_user_agent(user_agent.clone());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    args.apply_overrides(&mut config);
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    // Initialize logging subsystem
    tilemark::logging::init_subscriber(&config.logging)
        .context("Failed to initialize logging subsystem")?;

    let rasterizer = FontRasterizer::load(config.font.path.as_deref())?;
    tracing::info!(
        font = %rasterizer.source().display(),
        text = %config.watermark.text,
        output_dir = %config.export.output_dir.display(),
        "Configuration loaded successfully"
    );

    if args.test {
        println!("Configuration OK");
        return Ok(());
    }

    let mut session = ImageSession::new();
    for path in &args.images {
        // Rejected files are logged by the session and skipped
        if let Err(e) = session.add_file(path).await {
            eprintln!("Skipping {}: {}", path.display(), e);
        }
    }
    if session.is_empty() {
        bail!("No images to watermark");
    }

    let compositor = TileCompositor::new(Arc::new(rasterizer));
    let host = Arc::new(FilesystemHost::with_probe(
        config.export.output_dir.clone(),
        config.export.probe(),
    ));
    let dyn_host: Arc<dyn ExportHost> = host.clone();
    let exporter = Exporter::new(dyn_host).with_file_namer(config.export.file_namer());

    let progress = |p: &tilemark::export::ExportProgress| tracing::info!("{}", p);
    let mut surface = CompositeSurface::new();
    let mut failed = 0usize;

    for entry in session.images() {
        let outcome = compositor.composite(&mut surface, entry.image(), &config.watermark);
        tracing::debug!(file_name = %entry.file_name(), outcome = ?outcome, "Composited");

        if !exporter
            .export_surface(&surface, entry.file_name(), Some(&progress))
            .await
        {
            failed += 1;
        }
    }

    for path in host.written_files() {
        println!("{}", path.display());
    }

    if failed > 0 {
        bail!("{} of {} images failed to export", failed, session.len());
    }
    Ok(())
}
