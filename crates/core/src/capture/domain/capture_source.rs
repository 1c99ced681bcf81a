use thiserror::Error;

use crate::capture::domain::camera_backend::{CameraBackend, LiveStream};
use crate::shared::frame::Frame;
use crate::shared::still_frame::StillFrame;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("no active camera stream")]
    NoActiveStream,
    #[error("failed to read frame: {0}")]
    Grab(String),
}

/// Owns the single live camera binding and samples still frames from it.
pub struct CaptureSource {
    backend: Box<dyn CameraBackend>,
    stream: Option<Box<dyn LiveStream>>,
    frame_width: u32,
    frame_height: u32,
    next_sequence: usize,
}

impl CaptureSource {
    /// `frame_width` x `frame_height` is the fixed size of every grabbed still.
    pub fn new(backend: Box<dyn CameraBackend>, frame_width: u32, frame_height: u32) -> Self {
        Self {
            backend,
            stream: None,
            frame_width: frame_width.max(1),
            frame_height: frame_height.max(1),
            next_sequence: 0,
        }
    }

    /// Opens the camera and binds it, replacing any existing binding.
    ///
    /// The previous stream is released before the device is reopened. On
    /// failure nothing is bound.
    pub fn start_camera(&mut self) -> Result<(), CaptureError> {
        self.stop_camera();

        match self.backend.open() {
            Ok(stream) => {
                log::info!("Camera started: {}", self.backend.describe());
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                log::error!("Error accessing the camera {}: {e}", self.backend.describe());
                Err(CaptureError::Unavailable(e.to_string()))
            }
        }
    }

    /// Releases the bound stream, if any.
    pub fn stop_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            log::debug!("Camera stream released");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Samples the bound stream into a still frame of the configured size.
    ///
    /// The camera image is stretched to fill the frame, matching what a
    /// preview surface of that size displays.
    pub fn grab_frame(&mut self) -> Result<StillFrame, CaptureError> {
        let raw = self.read_live()?;
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let frame = fit_to_size(raw, self.frame_width, self.frame_height)?;
        Ok(StillFrame::new(frame.with_sequence(sequence)))
    }

    /// The next live frame at camera resolution, for a preview surface.
    pub fn preview_frame(&mut self) -> Result<Frame, CaptureError> {
        self.read_live()
    }

    fn read_live(&mut self) -> Result<Frame, CaptureError> {
        let stream = self.stream.as_mut().ok_or(CaptureError::NoActiveStream)?;
        stream
            .read_frame()
            .map_err(|e| CaptureError::Grab(e.to_string()))
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.stop_camera();
    }
}

fn fit_to_size(raw: Frame, width: u32, height: u32) -> Result<Frame, CaptureError> {
    if !raw.is_well_formed() || raw.channels() != 3 {
        return Err(CaptureError::Grab(format!(
            "camera delivered a malformed {}x{}x{} frame",
            raw.width(),
            raw.height(),
            raw.channels()
        )));
    }
    if raw.width() == width && raw.height() == height {
        return Ok(raw);
    }

    let (w, h, seq) = (raw.width(), raw.height(), raw.sequence());
    let img = image::RgbImage::from_raw(w, h, raw.data().to_vec())
        .ok_or_else(|| CaptureError::Grab("frame buffer does not match its size".into()))?;
    let resized = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
    Ok(Frame::new(resized.into_raw(), width, height, 3, seq))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Camera whose streams replay one fixed frame. Counts opens and closes.
    pub struct StubCamera {
        pub frame: Frame,
        pub deny: bool,
        pub opened: Arc<AtomicUsize>,
        pub closed: Arc<AtomicUsize>,
    }

    impl StubCamera {
        pub fn new(frame: Frame) -> Self {
            Self {
                frame,
                deny: false,
                opened: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn denied() -> Self {
            Self {
                deny: true,
                ..Self::new(Frame::filled(1, 1, [0, 0, 0], 0))
            }
        }
    }

    impl CameraBackend for StubCamera {
        fn open(&mut self) -> Result<Box<dyn LiveStream>, Box<dyn std::error::Error>> {
            if self.deny {
                return Err("permission denied".into());
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubStream {
                frame: self.frame.clone(),
                closed: self.closed.clone(),
            }))
        }

        fn describe(&self) -> String {
            "stub camera".into()
        }
    }

    struct StubStream {
        frame: Frame,
        closed: Arc<AtomicUsize>,
    }

    impl LiveStream for StubStream {
        fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
            Ok(self.frame.clone())
        }

        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
