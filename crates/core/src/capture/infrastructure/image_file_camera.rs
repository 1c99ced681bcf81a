use std::path::{Path, PathBuf};

use crate::capture::domain::camera_backend::{CameraBackend, LiveStream};
use crate::shared::frame::Frame;

/// Presents a still image file as a camera whose stream never changes.
///
/// Lets the pipeline run on saved photos exactly as it does on live capture.
pub struct ImageFileCamera {
    path: PathBuf,
}

impl ImageFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CameraBackend for ImageFileCamera {
    fn open(&mut self) -> Result<Box<dyn LiveStream>, Box<dyn std::error::Error>> {
        let frame = decode_rgb(&self.path)?;
        Ok(Box::new(ImageFileStream { frame }))
    }

    fn describe(&self) -> String {
        format!("image file {}", self.path.display())
    }
}

fn decode_rgb(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.into_rgb8();
    let (w, h) = img.dimensions();
    Ok(Frame::new(img.into_raw(), w, h, 3, 0))
}

struct ImageFileStream {
    frame: Frame,
}

impl LiveStream for ImageFileStream {
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        Ok(self.frame.clone())
    }
}
