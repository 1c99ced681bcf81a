use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::catalog::product_catalog::{CatalogError, ProductCatalog};
use crate::detection::domain::detector_lifecycle::{DetectorLifecycle, DetectorState};
use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::detection::domain::landmark_extractor::{DetectionError, LandmarkExtractor};
use crate::detection::domain::model_loader::ModelLoadError;
use crate::overlay::domain::asset_loader::{AssetError, AssetLoader};
use crate::overlay::domain::compositor::{CompositeOutcome, OverlayCompositor};
use crate::overlay::domain::overlay_asset::OverlayAsset;
use crate::overlay::domain::placement::{Placement, PlacementError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::still_frame::StillFrame;

#[derive(Error, Debug)]
pub enum TryOnError {
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("unknown product id {0}")]
    UnknownProduct(i64),
}

#[derive(Debug)]
pub enum CaptureStatus {
    Composited(Placement),
    NoFaceDetected,
    NoOverlaySelected,
    /// The capture or placement failed and was recovered; the session is idle.
    Failed(TryOnError),
}

/// Outcome of one capture or re-placement.
#[derive(Debug)]
pub struct CaptureReport {
    pub status: CaptureStatus,
    /// What the output surface shows now. `None` when nothing was ever captured.
    pub surface: Option<Frame>,
    pub faces: usize,
}

impl CaptureReport {
    pub fn is_composited(&self) -> bool {
        matches!(self.status, CaptureStatus::Composited(_))
    }

    pub fn error(&self) -> Option<&TryOnError> {
        match &self.status {
            CaptureStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Capture → detect → place → render, driven one capture at a time.
///
/// Keeps the last still and its landmarks so a new overlay selection can be
/// re-rendered without grabbing again. Every failure is logged and reported
/// in the [`CaptureReport`]; the session stays usable afterwards.
pub struct TryOnSession {
    capture: CaptureSource,
    extractor: LandmarkExtractor,
    compositor: OverlayCompositor,
    asset_loader: Box<dyn AssetLoader>,
    catalog: ProductCatalog,
    logger: Box<dyn PipelineLogger>,
    selected: Option<OverlayAsset>,
    last_capture: Option<(StillFrame, LandmarkSet)>,
    displayed: Option<Frame>,
}

impl TryOnSession {
    pub fn new(
        capture: CaptureSource,
        extractor: LandmarkExtractor,
        compositor: OverlayCompositor,
        asset_loader: Box<dyn AssetLoader>,
        catalog: ProductCatalog,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            capture,
            extractor,
            compositor,
            asset_loader,
            catalog,
            logger,
            selected: None,
            last_capture: None,
            displayed: None,
        }
    }

    pub fn detector(&self) -> &Arc<DetectorLifecycle> {
        self.extractor.lifecycle()
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn start_camera(&mut self) -> Result<(), TryOnError> {
        self.capture.start_camera()?;
        self.logger.info("Camera ready");
        Ok(())
    }

    pub fn stop_camera(&mut self) {
        self.capture.stop_camera();
    }

    pub fn is_camera_active(&self) -> bool {
        self.capture.is_active()
    }

    /// Grabs a still, detects landmarks and composites the selected overlay.
    ///
    /// Nothing is grabbed while the detector is not `Ready`.
    pub fn capture(&mut self) -> CaptureReport {
        let report = self.run_capture();
        self.logger.capture_finished();
        report
    }

    fn run_capture(&mut self) -> CaptureReport {
        let state = self.detector().state();
        if state != DetectorState::Ready {
            return self.fail(DetectionError::NotReady(state).into());
        }

        let t0 = Instant::now();
        let still = match self.capture.grab_frame() {
            Ok(still) => still,
            Err(e) => return self.fail(e.into()),
        };
        self.logger.timing("grab", elapsed_ms(t0));

        let t0 = Instant::now();
        let landmarks = match self.extractor.detect(&still) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                self.last_capture = None;
                self.displayed = Some(still.to_frame());
                return self.fail(e.into());
            }
        };
        self.logger.timing("detect", elapsed_ms(t0));
        self.logger.metric("faces", landmarks.len() as f64);

        let report = self.composite(&still, &landmarks);
        self.last_capture = Some((still, landmarks));
        report
    }

    /// Selects a catalog product and re-renders the last capture with it.
    pub fn select_product(&mut self, id: i64) -> Result<Option<CaptureReport>, TryOnError> {
        let product = self.catalog.get(id).ok_or(TryOnError::UnknownProduct(id))?;
        let (name, uri) = (product.name.clone(), product.image_url.clone());
        let report = self.select_overlay(&uri)?;
        self.logger.info(&format!("Selected product {id} ({name})"));
        Ok(report)
    }

    /// Loads `uri` as the current overlay, replacing any previous selection.
    ///
    /// On failure the previous selection is kept. Returns the re-rendered
    /// report when a capture is available.
    pub fn select_overlay(&mut self, uri: &str) -> Result<Option<CaptureReport>, TryOnError> {
        let t0 = Instant::now();
        let asset = self.asset_loader.load(uri).map_err(|e| {
            let err = AssetError {
                uri: uri.to_string(),
                reason: e.to_string(),
            };
            log::error!("{err}");
            err
        })?;
        self.logger.timing("decode", elapsed_ms(t0));

        self.selected = Some(asset);
        Ok(self.place_overlay())
    }

    pub fn clear_selection(&mut self) -> Option<CaptureReport> {
        self.selected = None;
        self.place_overlay()
    }

    pub fn selected_overlay(&self) -> Option<&OverlayAsset> {
        self.selected.as_ref()
    }

    /// Re-renders the last capture from its pristine still. `None` if there is
    /// no successful capture yet.
    pub fn place_overlay(&mut self) -> Option<CaptureReport> {
        let (still, landmarks) = self.last_capture.clone()?;
        Some(self.composite(&still, &landmarks))
    }

    /// The surface currently shown: the last composite or unmodified still.
    pub fn surface(&self) -> Option<&Frame> {
        self.displayed.as_ref()
    }

    /// Emits the logger's end-of-session summary.
    pub fn summary(&self) {
        self.logger.summary();
    }

    fn composite(&mut self, still: &StillFrame, landmarks: &LandmarkSet) -> CaptureReport {
        let t0 = Instant::now();
        let result = self
            .compositor
            .composite(still, landmarks, self.selected.as_ref());
        self.logger.timing("render", elapsed_ms(t0));

        let (surface, status) = match result {
            Ok(composite) => {
                let status = match composite.outcome() {
                    CompositeOutcome::Placed(p) => CaptureStatus::Composited(p),
                    CompositeOutcome::NoFaceDetected => CaptureStatus::NoFaceDetected,
                    CompositeOutcome::NoOverlaySelected => CaptureStatus::NoOverlaySelected,
                };
                (composite.into_surface(), status)
            }
            Err(e) => {
                log::warn!("Overlay skipped: {e}");
                (still.to_frame(), CaptureStatus::Failed(e.into()))
            }
        };

        self.displayed = Some(surface.clone());
        CaptureReport {
            status,
            surface: Some(surface),
            faces: landmarks.len(),
        }
    }

    fn fail(&mut self, error: TryOnError) -> CaptureReport {
        log::error!("Capture failed: {error}");
        CaptureReport {
            status: CaptureStatus::Failed(error),
            surface: self.displayed.clone(),
            faces: 0,
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
