use thiserror::Error;

use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::landmark_model::LandmarkModel;

/// One of the detection sub-models could not be fetched or instantiated.
///
/// Carries a rendered reason so the failure can be kept in the lifecycle
/// state and reported to every later caller.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to load {model}: {reason}")]
pub struct ModelLoadError {
    pub model: String,
    pub reason: String,
}

impl ModelLoadError {
    pub fn new(model: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// The full set of sub-models a detection needs. Never partially populated.
pub struct DetectorModels {
    pub locator: Box<dyn FaceLocator>,
    pub landmarks: Box<dyn LandmarkModel>,
}

/// Produces a complete [`DetectorModels`] or fails as a whole.
pub trait ModelLoader: Send + Sync {
    fn load(&self) -> Result<DetectorModels, ModelLoadError>;
}
