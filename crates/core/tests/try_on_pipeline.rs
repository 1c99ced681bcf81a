use std::path::Path;
use std::sync::Arc;

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

use tryon_core::capture::domain::capture_source::CaptureSource;
use tryon_core::capture::infrastructure::image_file_camera::ImageFileCamera;
use tryon_core::catalog::product_catalog::ProductCatalog;
use tryon_core::detection::domain::detector_lifecycle::{DetectorLifecycle, DetectorState};
use tryon_core::detection::domain::face_landmarks::LANDMARK_COUNT;
use tryon_core::detection::domain::face_locator::{FaceBox, FaceLocator};
use tryon_core::detection::domain::landmark_extractor::{DetectionError, LandmarkExtractor};
use tryon_core::detection::domain::landmark_model::LandmarkModel;
use tryon_core::detection::domain::model_loader::{DetectorModels, ModelLoadError, ModelLoader};
use tryon_core::overlay::domain::compositor::OverlayCompositor;
use tryon_core::overlay::domain::surface_encoder::SurfaceEncoder;
use tryon_core::overlay::infrastructure::cpu_overlay_renderer::CpuOverlayRenderer;
use tryon_core::overlay::infrastructure::image_asset_loader::ImageAssetLoader;
use tryon_core::overlay::infrastructure::png_surface_encoder::PngSurfaceEncoder;
use tryon_core::pipeline::pipeline_logger::NullPipelineLogger;
use tryon_core::pipeline::try_on_session::{CaptureStatus, TryOnError, TryOnSession};
use tryon_core::shared::frame::Frame;
use tryon_core::shared::geometry::Point;

const BACKGROUND: [u8; 3] = [40, 60, 80];

/// Reports one fixed face box per frame.
struct FixedLocator(Vec<FaceBox>);

impl FaceLocator for FixedLocator {
    fn locate(&mut self, _frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        Ok(self.0.clone())
    }
}

/// Reports the given eye anchors for every face.
struct FixedEyes {
    left: Point,
    right: Point,
}

impl LandmarkModel for FixedEyes {
    fn landmarks(
        &mut self,
        _frame: &Frame,
        face: &FaceBox,
    ) -> Result<Vec<Point>, Box<dyn std::error::Error>> {
        let mut points = vec![Point::new(face.x1, face.y1); LANDMARK_COUNT];
        points[36] = self.left;
        points[42] = self.right;
        Ok(points)
    }
}

struct FixedModels {
    faces: Vec<FaceBox>,
    left: Point,
    right: Point,
    fail: bool,
}

impl ModelLoader for FixedModels {
    fn load(&self) -> Result<DetectorModels, ModelLoadError> {
        if self.fail {
            return Err(ModelLoadError::new("face_landmarks_68.onnx", "not found"));
        }
        Ok(DetectorModels {
            locator: Box::new(FixedLocator(self.faces.clone())),
            landmarks: Box::new(FixedEyes {
                left: self.left,
                right: self.right,
            }),
        })
    }
}

fn face() -> FaceBox {
    FaceBox {
        x1: 150.0,
        y1: 120.0,
        x2: 310.0,
        y2: 340.0,
        score: 0.93,
    }
}

fn write_camera_image(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("camera.png");
    RgbImage::from_pixel(640, 480, Rgb(BACKGROUND)).save(&path).unwrap();
    path
}

fn write_overlay(dir: &Path, name: &str, w: u32, h: u32, rgba: [u8; 4]) {
    RgbaImage::from_pixel(w, h, Rgba(rgba))
        .save(dir.join(name))
        .unwrap();
}

fn session(dir: &Path, loader: FixedModels, catalog: ProductCatalog) -> TryOnSession {
    let lifecycle = Arc::new(DetectorLifecycle::new(Arc::new(loader)));
    lifecycle.initialize();
    lifecycle.wait_until_settled();

    TryOnSession::new(
        CaptureSource::new(Box::new(ImageFileCamera::new(write_camera_image(dir))), 640, 480),
        LandmarkExtractor::new(lifecycle),
        OverlayCompositor::new(Box::new(CpuOverlayRenderer::default())),
        Box::new(ImageAssetLoader::with_base_dir(dir)),
        catalog,
        Box::new(NullPipelineLogger),
    )
}

fn reference_eyes(faces: Vec<FaceBox>) -> FixedModels {
    FixedModels {
        faces,
        left: Point::new(200.0, 220.0),
        right: Point::new(260.0, 218.0),
        fail: false,
    }
}

fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
    let px = frame.as_ndarray();
    [px[[y, x, 0]], px[[y, x, 1]], px[[y, x, 2]]]
}

#[test]
fn test_reference_scenario_places_overlay_between_eyes() {
    let tmp = TempDir::new().unwrap();
    write_overlay(tmp.path(), "aviator.png", 300, 100, [255, 0, 0, 255]);
    let mut session = session(tmp.path(), reference_eyes(vec![face()]), ProductCatalog::empty());
    session.start_camera().unwrap();
    session.select_overlay("aviator.png").unwrap();

    let report = session.capture();

    let CaptureStatus::Composited(placement) = report.status else {
        panic!("expected a composite, got {:?}", report.status);
    };
    let rect = placement.rect;
    for (actual, expected) in [
        (placement.scale, 0.2),
        (rect.x, 200.0),
        (rect.y, 210.0),
        (rect.width, 60.0),
        (rect.height, 20.0),
    ] {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    let surface = report.surface.unwrap();
    assert_eq!(pixel(&surface, 230, 220), [255, 0, 0]);
    assert_eq!(pixel(&surface, 230, 205), BACKGROUND);
    assert_eq!(pixel(&surface, 265, 220), BACKGROUND);
}

#[test]
fn test_zero_faces_leaves_capture_unmodified() {
    let tmp = TempDir::new().unwrap();
    write_overlay(tmp.path(), "aviator.png", 300, 100, [255, 0, 0, 255]);
    let mut session = session(tmp.path(), reference_eyes(Vec::new()), ProductCatalog::empty());
    session.start_camera().unwrap();
    session.select_overlay("aviator.png").unwrap();

    let report = session.capture();

    assert!(matches!(report.status, CaptureStatus::NoFaceDetected));
    assert_eq!(report.faces, 0);
    assert_eq!(report.surface.unwrap(), Frame::filled(640, 480, BACKGROUND, 0));
}

#[test]
fn test_switching_products_rerenders_from_pristine_capture() {
    let tmp = TempDir::new().unwrap();
    write_overlay(tmp.path(), "tall.png", 60, 60, [0, 255, 0, 255]);
    write_overlay(tmp.path(), "slim.png", 300, 30, [0, 0, 255, 255]);
    let catalog = ProductCatalog::from_json(
        r#"[
            {"id": 1, "name": "Round", "price": "$80", "details": "", "imageUrl": "tall.png"},
            {"id": 2, "name": "Slim", "price": "$95", "details": "", "imageUrl": "slim.png"}
        ]"#,
    )
    .unwrap();
    let mut session = session(tmp.path(), reference_eyes(vec![face()]), catalog);
    session.start_camera().unwrap();
    session.select_product(1).unwrap();
    session.capture();
    assert_eq!(pixel(session.surface().unwrap(), 230, 195), [0, 255, 0]);

    let report = session.select_product(2).unwrap().unwrap();

    assert!(report.is_composited());
    let surface = session.surface().unwrap();
    // The slim overlay spans rows 217..223; the tall one reached row 190.
    assert_eq!(pixel(surface, 230, 220), [0, 0, 255]);
    assert_eq!(pixel(surface, 230, 195), BACKGROUND);
}

#[test]
fn test_reversed_eyes_are_rejected_every_time() {
    let tmp = TempDir::new().unwrap();
    write_overlay(tmp.path(), "aviator.png", 300, 100, [255, 0, 0, 255]);
    let loader = FixedModels {
        faces: vec![face()],
        left: Point::new(260.0, 220.0),
        right: Point::new(200.0, 218.0),
        fail: false,
    };
    let mut session = session(tmp.path(), loader, ProductCatalog::empty());
    session.start_camera().unwrap();
    session.select_overlay("aviator.png").unwrap();

    for _ in 0..2 {
        let report = session.capture();
        assert!(matches!(report.error(), Some(TryOnError::Placement(_))));
        assert_eq!(
            report.surface.unwrap().data(),
            Frame::filled(640, 480, BACKGROUND, 0).data()
        );
    }
}

#[test]
fn test_failed_model_load_fails_detection_fast() {
    let tmp = TempDir::new().unwrap();
    let loader = FixedModels {
        fail: true,
        ..reference_eyes(vec![face()])
    };
    let mut session = session(tmp.path(), loader, ProductCatalog::empty());
    session.start_camera().unwrap();

    assert_eq!(session.detector().state(), DetectorState::Failed);
    let report = session.capture();

    assert!(matches!(
        report.error(),
        Some(TryOnError::Detection(DetectionError::NotReady(DetectorState::Failed)))
    ));
    assert!(session.surface().is_none());
}

#[test]
fn test_composite_encodes_to_png() {
    let tmp = TempDir::new().unwrap();
    write_overlay(tmp.path(), "aviator.png", 300, 100, [255, 0, 0, 255]);
    let mut session = session(tmp.path(), reference_eyes(vec![face()]), ProductCatalog::empty());
    session.start_camera().unwrap();
    session.select_overlay("aviator.png").unwrap();
    session.capture();

    let png = PngSurfaceEncoder.encode(session.surface().unwrap()).unwrap();

    let decoded = image::load_from_memory(&png).unwrap().into_rgb8();
    assert_eq!(decoded.dimensions(), (640, 480));
    assert_eq!(decoded.get_pixel(230, 220).0, [255, 0, 0]);
}
