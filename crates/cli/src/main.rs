use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use tryon_core::capture::domain::camera_backend::CameraBackend;
use tryon_core::capture::domain::capture_source::CaptureSource;
use tryon_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
use tryon_core::capture::infrastructure::image_file_camera::ImageFileCamera;
use tryon_core::catalog::product_catalog::ProductCatalog;
use tryon_core::detection::domain::detector_lifecycle::{DetectorLifecycle, DetectorState};
use tryon_core::detection::domain::landmark_extractor::LandmarkExtractor;
use tryon_core::detection::infrastructure::onnx_model_loader::{ModelSource, OnnxModelLoader};
use tryon_core::overlay::domain::compositor::OverlayCompositor;
use tryon_core::overlay::domain::surface_encoder::SurfaceEncoder;
use tryon_core::overlay::infrastructure::cpu_overlay_renderer::CpuOverlayRenderer;
use tryon_core::overlay::infrastructure::image_asset_loader::ImageAssetLoader;
use tryon_core::overlay::infrastructure::png_surface_encoder::PngSurfaceEncoder;
use tryon_core::pipeline::capture_worker::{CaptureMessage, CaptureWorker};
use tryon_core::pipeline::pipeline_logger::LogPipelineLogger;
use tryon_core::pipeline::try_on_session::{CaptureStatus, TryOnSession};
use tryon_core::shared::constants::IMAGE_EXTENSIONS;
use tryon_core::shared::settings::TryOnSettings;

/// Capture a still from a camera and try eyewear on it.
#[derive(Parser)]
#[command(name = "tryon")]
struct Cli {
    /// Output PNG for the composite (required unless --list-products is used).
    output: Option<PathBuf>,

    /// Image file to use as the camera instead of a capture device.
    #[arg(long, conflicts_with_all = ["camera", "camera_format"])]
    input: Option<PathBuf>,

    /// Capture device, e.g. /dev/video0.
    #[arg(long)]
    camera: Option<String>,

    /// libavdevice input format, e.g. v4l2, avfoundation, dshow.
    #[arg(long)]
    camera_format: Option<String>,

    /// Product list JSON with id, name, price, details and imageUrl.
    #[arg(long)]
    products: Option<PathBuf>,

    /// Product to try on, by id.
    #[arg(long, conflicts_with = "overlay")]
    product_id: Option<i64>,

    /// Eyewear image to try on: a path, file:// URI or http(s) URL.
    #[arg(long)]
    overlay: Option<String>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Still frame size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size)]
    frame_size: Option<(u32, u32)>,

    /// Directory searched for model files before downloading.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Base URL model files are downloaded from.
    #[arg(long)]
    model_base_url: Option<String>,

    /// Print the product list and exit.
    #[arg(long)]
    list_products: bool,

    /// Store the camera and model options as new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let settings = apply_overrides(TryOnSettings::load(), &cli);
    if cli.save_settings {
        settings.save();
    }

    let catalog = ProductCatalog::load(cli.products.as_deref())?;
    if cli.list_products {
        print_products(&catalog);
        return Ok(());
    }
    let Some(output) = cli.output.as_deref() else {
        return Err("Output file is required".into());
    };

    let lifecycle = Arc::new(DetectorLifecycle::new(Arc::new(OnnxModelLoader::new(
        ModelSource {
            models_dir: settings.models_dir.clone(),
            base_url: settings.model_base_url.clone(),
        },
        settings.confidence,
    ))));
    lifecycle.initialize();

    let mut session = build_session(&cli, &settings, Arc::clone(&lifecycle), catalog);
    session.start_camera()?;

    match lifecycle.wait_until_settled() {
        DetectorState::Ready => {}
        state => {
            return Err(match lifecycle.failure() {
                Some(e) => e.into(),
                None => format!("face detector is not ready ({state:?})").into(),
            })
        }
    }

    if let Some(id) = cli.product_id {
        session.select_product(id)?;
    } else if let Some(uri) = cli.overlay.as_deref() {
        session.select_overlay(uri)?;
    }

    let worker = CaptureWorker::new(session);
    let report = match worker.request_capture().recv()? {
        CaptureMessage::Complete(report) => report,
        CaptureMessage::Busy => return Err("a capture is already in progress".into()),
    };

    match &report.status {
        CaptureStatus::Composited(p) => log::info!(
            "Overlay placed at ({:.0}, {:.0}) size {:.0}x{:.0}",
            p.rect.x,
            p.rect.y,
            p.rect.width,
            p.rect.height
        ),
        CaptureStatus::NoFaceDetected => log::warn!("No face detected; writing the plain capture"),
        CaptureStatus::NoOverlaySelected => log::info!("No overlay selected; writing the plain capture"),
        CaptureStatus::Failed(e) => log::warn!("{e}"),
    }

    let Some(surface) = report.surface else {
        return Err(match report.status {
            CaptureStatus::Failed(e) => e.into(),
            _ => "nothing was captured".into(),
        });
    };

    let png = PngSurfaceEncoder.encode(&surface)?;
    fs::write(output, png)?;
    log::info!("Output written to {}", output.display());

    let mut session = worker.session();
    session.stop_camera();
    session.summary();
    Ok(())
}

fn build_session(
    cli: &Cli,
    settings: &TryOnSettings,
    lifecycle: Arc<DetectorLifecycle>,
    catalog: ProductCatalog,
) -> TryOnSession {
    let (width, height) = (settings.frame_width, settings.frame_height);
    let backend: Box<dyn CameraBackend> = match &cli.input {
        Some(path) => Box::new(ImageFileCamera::new(path)),
        None => Box::new(FfmpegCamera::new(
            settings.camera_device.clone(),
            settings.camera_format.clone(),
            width,
            height,
        )),
    };

    let asset_loader = match asset_base_dir(cli) {
        Some(dir) => ImageAssetLoader::with_base_dir(dir),
        None => ImageAssetLoader::new(),
    };

    TryOnSession::new(
        CaptureSource::new(backend, width, height),
        LandmarkExtractor::new(lifecycle),
        OverlayCompositor::new(Box::new(CpuOverlayRenderer::default())),
        Box::new(asset_loader),
        catalog,
        Box::new(LogPipelineLogger::new()),
    )
}

/// Relative imageUrl entries are resolved next to the product list. An
/// `--overlay` path is taken as given, relative to the working directory.
fn asset_base_dir(cli: &Cli) -> Option<&Path> {
    cli.product_id?;
    cli.products.as_deref().and_then(Path::parent)
}

fn apply_overrides(mut settings: TryOnSettings, cli: &Cli) -> TryOnSettings {
    if let Some(camera) = &cli.camera {
        settings.camera_device = camera.clone();
    }
    if let Some(format) = &cli.camera_format {
        settings.camera_format = Some(format.clone());
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some((w, h)) = cli.frame_size {
        settings.frame_width = w;
        settings.frame_height = h;
    }
    if let Some(dir) = &cli.models_dir {
        settings.models_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.model_base_url {
        settings.model_base_url = Some(url.clone());
    }
    settings
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            return Err(format!("Input must be an image file, got {}", input.display()).into());
        }
    }
    if let Some(products) = &cli.products {
        if !products.exists() {
            return Err(format!("Product list not found: {}", products.display()).into());
        }
    }
    if cli.product_id.is_some() && cli.products.is_none() {
        return Err("--product-id requires --products".into());
    }
    if !cli.list_products && cli.output.is_none() {
        return Err("Output file is required unless --list-products is used".into());
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {confidence}"
            )
            .into());
        }
    }
    Ok(())
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("frame size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn print_products(catalog: &ProductCatalog) {
    if catalog.is_empty() {
        println!("No products.");
        return;
    }
    for product in catalog.products() {
        println!(
            "{:>4}  {:<24} {:>10}  {}",
            product.id, product.name, product.price, product.image_url
        );
    }
}
