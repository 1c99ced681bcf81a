use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam_channel::{bounded, Receiver};

use crate::pipeline::try_on_session::{CaptureReport, TryOnSession};

pub enum CaptureMessage {
    Complete(CaptureReport),
    /// A capture was already in flight; this request was refused.
    Busy,
}

/// Runs captures off the caller's thread, one at a time.
///
/// A presentation layer calls [`CaptureWorker::request_capture`] and polls or
/// blocks on the returned channel. While a capture is in flight further
/// requests are answered with [`CaptureMessage::Busy`]. If the receiver is
/// dropped before the result arrives, the result is discarded.
pub struct CaptureWorker {
    session: Arc<Mutex<TryOnSession>>,
    in_flight: Arc<AtomicBool>,
}

impl CaptureWorker {
    pub fn new(session: TryOnSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a capture is running. A UI disables its capture control on this.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Locks the session for selection or camera control.
    ///
    /// Blocks while a capture holds the session.
    pub fn session(&self) -> MutexGuard<'_, TryOnSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn request_capture(&self) -> Receiver<CaptureMessage> {
        let (tx, rx) = bounded(1);

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Capture refused: detection in progress");
            let _ = tx.send(CaptureMessage::Busy);
            return rx;
        }

        let session = Arc::clone(&self.session);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        thread::spawn(move || {
            let report = session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .capture();
            // Clear before sending so a consumer reacting to the result can
            // immediately request the next capture.
            drop(guard);
            if tx.send(CaptureMessage::Complete(report)).is_err() {
                log::debug!("Capture result dropped: receiver is gone");
            }
        });

        rx
    }
}

/// Clears the in-flight flag on drop, including when the capture panics.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
