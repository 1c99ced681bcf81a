use std::sync::Arc;

use crate::shared::frame::Frame;

/// A frame sampled from a live stream at one instant.
///
/// The pixels are shared and never mutated, so every placement can start from
/// the pristine capture. Rendering works on a copy obtained via [`StillFrame::to_frame`].
#[derive(Clone, Debug)]
pub struct StillFrame {
    frame: Arc<Frame>,
}

impl StillFrame {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    /// Owned copy of the pixels, used as the destination surface of a composite.
    pub fn to_frame(&self) -> Frame {
        Frame::clone(&self.frame)
    }
}
