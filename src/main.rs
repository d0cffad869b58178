use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use bbox_annotate::app::{AppConfig, BboxAnnotateApp, Mode};
use bbox_annotate::options::Options;

/// Draw bounding boxes on an image and submit them as form fields.
#[derive(Debug, Parser)]
#[command(name = "bbox-annotate", version)]
struct Cli {
    /// Image to annotate (png, jpg, ...).
    image: PathBuf,

    /// Value of the submitted `image_id` field.
    #[arg(long, default_value = "0")]
    image_id: String,

    /// JSON file with selector options (`minSize`, `aspectRatio`, `areas`, ...).
    #[arg(long)]
    options: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Mode::Plugin)]
    mode: Mode,

    /// Where submissions are written; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = match &cli.options {
        Some(path) => Options::load(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => Options::default(),
    };

    let title = format!(
        "bbox-annotate — {}",
        cli.image
            .file_name()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("")
    );
    let app = BboxAnnotateApp::new(AppConfig {
        image_path: cli.image.clone(),
        image_id: cli.image_id,
        options,
        mode: cli.mode,
        output: cli.output,
    })
    .with_context(|| format!("failed to open {}", cli.image.display()))?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        native_options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run eframe: {e}"))
}
