use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::detector_lifecycle::{DetectorLifecycle, DetectorState};
use crate::detection::domain::face_landmarks::{FaceLandmarks, LandmarkSet};
use crate::shared::still_frame::StillFrame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("detector not ready (state: {0:?})")]
    NotReady(DetectorState),
    #[error("face detection failed: {0}")]
    Invocation(String),
}

/// Runs face location followed by landmark regression on a still frame.
pub struct LandmarkExtractor {
    lifecycle: Arc<DetectorLifecycle>,
}

impl LandmarkExtractor {
    pub fn new(lifecycle: Arc<DetectorLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub fn lifecycle(&self) -> &Arc<DetectorLifecycle> {
        &self.lifecycle
    }

    /// Detects every face in `still` and returns its landmarks.
    ///
    /// Zero faces is an empty set, not an error. Fails fast with
    /// [`DetectionError::NotReady`] unless the detector is `Ready`.
    pub fn detect(&self, still: &StillFrame) -> Result<LandmarkSet, DetectionError> {
        let state = self.lifecycle.state();
        if state != DetectorState::Ready {
            return Err(DetectionError::NotReady(state));
        }

        let frame = still.frame();
        if !frame.is_well_formed() || frame.channels() != 3 {
            return Err(DetectionError::Invocation(format!(
                "malformed frame: {}x{}x{} with {} bytes",
                frame.width(),
                frame.height(),
                frame.channels(),
                frame.data().len()
            )));
        }

        let outcome = self.lifecycle.with_models(|models| {
            let faces = models
                .locator
                .locate(frame)
                .map_err(|e| DetectionError::Invocation(e.to_string()))?;

            let mut detected = Vec::with_capacity(faces.len());
            for face in &faces {
                let points = models
                    .landmarks
                    .landmarks(frame, face)
                    .map_err(|e| DetectionError::Invocation(e.to_string()))?;
                let landmarks =
                    FaceLandmarks::new(points, face.score).map_err(DetectionError::Invocation)?;
                detected.push(landmarks);
            }
            Ok(LandmarkSet::new(detected))
        });

        match outcome {
            Some(result) => {
                if let Ok(set) = &result {
                    log::debug!("Detected {} face(s) in frame {}", set.len(), frame.sequence());
                }
                result
            }
            None => Err(DetectionError::NotReady(self.lifecycle.state())),
        }
    }
}
