use std::path::{Path, PathBuf};

use crate::detection::domain::model_loader::{DetectorModels, ModelLoadError, ModelLoader};
use crate::shared::constants::{FACE_LOCATOR_MODEL_NAME, LANDMARK_MODEL_NAME};

use super::model_resolver::{self, ProgressFn};
use super::onnx_blazeface_locator::OnnxBlazefaceLocator;
use super::onnx_landmark_model::OnnxLandmarkModel;

/// Where model files come from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelSource {
    pub models_dir: Option<PathBuf>,
    pub base_url: Option<String>,
}

/// Resolves both model files, then builds ONNX sessions for them.
///
/// Any failure fails the whole load; no partially constructed
/// [`DetectorModels`] is ever returned.
pub struct OnnxModelLoader {
    source: ModelSource,
    confidence: f64,
}

impl OnnxModelLoader {
    pub fn new(source: ModelSource, confidence: f64) -> Self {
        Self { source, confidence }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, ModelLoadError> {
        log::info!("Resolving model: {name}");
        let progress: ProgressFn = Box::new({
            let name = name.to_string();
            move |downloaded, total| {
                if total > 0 {
                    log::debug!("{name}: {downloaded}/{total} bytes");
                }
            }
        });
        model_resolver::resolve(
            name,
            self.source.base_url.as_deref(),
            self.source.models_dir.as_deref(),
            Some(progress),
        )
        .map_err(|e| ModelLoadError::new(name, e))
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<DetectorModels, ModelLoadError> {
        let locator_path = self.resolve(FACE_LOCATOR_MODEL_NAME)?;
        let landmark_path = self.resolve(LANDMARK_MODEL_NAME)?;

        let locator = OnnxBlazefaceLocator::new(&locator_path, self.confidence)
            .map_err(|e| session_error(FACE_LOCATOR_MODEL_NAME, &locator_path, &*e))?;
        let landmarks = OnnxLandmarkModel::new(&landmark_path)
            .map_err(|e| session_error(LANDMARK_MODEL_NAME, &landmark_path, &*e))?;

        Ok(DetectorModels {
            locator: Box::new(locator),
            landmarks: Box::new(landmarks),
        })
    }
}

fn session_error(name: &str, path: &Path, e: &dyn std::error::Error) -> ModelLoadError {
    ModelLoadError::new(name, format!("{}: {e}", path.display()))
}
