use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;

use crate::detection::domain::model_loader::{DetectorModels, ModelLoadError, ModelLoader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Owns loading and readiness of the detection models.
///
/// `initialize` starts a background load and returns immediately; callers
/// that need the result block in [`DetectorLifecycle::wait_until_settled`].
/// Create one per process and share it behind an `Arc`.
pub struct DetectorLifecycle {
    loader: Arc<dyn ModelLoader>,
    slot: Arc<DetectorSlot>,
}

struct DetectorSlot {
    status: Mutex<Status>,
    settled: Condvar,
    models: Mutex<Option<DetectorModels>>,
}

struct Status {
    state: DetectorState,
    failure: Option<ModelLoadError>,
}

impl DetectorLifecycle {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: Arc::new(DetectorSlot {
                status: Mutex::new(Status {
                    state: DetectorState::Unloaded,
                    failure: None,
                }),
                settled: Condvar::new(),
                models: Mutex::new(None),
            }),
        }
    }

    /// Begins loading all sub-models on a background thread.
    ///
    /// No-op while `Loading` or `Ready`. From `Failed` a new attempt starts.
    /// Returns whether a load was started by this call.
    pub fn initialize(&self) -> bool {
        {
            let mut status = self.slot.lock_status();
            if matches!(status.state, DetectorState::Loading | DetectorState::Ready) {
                return false;
            }
            status.state = DetectorState::Loading;
            status.failure = None;
        }

        let slot = self.slot.clone();
        let loader = self.loader.clone();
        thread::spawn(move || {
            let result = loader.load();
            slot.finish(result);
        });
        true
    }

    /// Starts loading if needed and blocks until the models settle.
    pub fn initialize_and_wait(&self) -> Result<(), ModelLoadError> {
        self.initialize();
        match self.wait_until_settled() {
            DetectorState::Ready => Ok(()),
            _ => Err(self
                .failure()
                .unwrap_or_else(|| ModelLoadError::new("detector", "load did not complete"))),
        }
    }

    /// Blocks while a load is in flight and returns the resulting state.
    ///
    /// Returns `Unloaded` immediately if `initialize` was never called.
    pub fn wait_until_settled(&self) -> DetectorState {
        let mut status = self.slot.lock_status();
        while status.state == DetectorState::Loading {
            status = self
                .slot
                .settled
                .wait(status)
                .unwrap_or_else(PoisonError::into_inner);
        }
        status.state
    }

    pub fn state(&self) -> DetectorState {
        self.slot.lock_status().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == DetectorState::Ready
    }

    /// The error recorded by the last failed load, if the detector is `Failed`.
    pub fn failure(&self) -> Option<ModelLoadError> {
        self.slot.lock_status().failure.clone()
    }

    /// Runs `f` with exclusive access to the loaded models.
    ///
    /// Returns `None` without calling `f` unless the detector is `Ready`.
    pub fn with_models<R>(&self, f: impl FnOnce(&mut DetectorModels) -> R) -> Option<R> {
        if !self.is_ready() {
            return None;
        }
        let mut models = self
            .slot
            .models
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        models.as_mut().map(f)
    }
}

impl DetectorSlot {
    fn lock_status(&self) -> std::sync::MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, result: Result<DetectorModels, ModelLoadError>) {
        match result {
            Ok(models) => {
                // Models are stored before the state flips so a Ready detector
                // always has them.
                *self.models.lock().unwrap_or_else(PoisonError::into_inner) = Some(models);
                self.lock_status().state = DetectorState::Ready;
                log::info!("Detection models loaded");
            }
            Err(e) => {
                log::error!("Error loading detection models: {e}");
                let mut status = self.lock_status();
                status.state = DetectorState::Failed;
                status.failure = Some(e);
            }
        }
        self.settled.notify_all();
    }
}
