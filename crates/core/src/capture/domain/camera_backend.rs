use crate::shared::frame::Frame;

/// Grants access to a video input device.
///
/// Opening is where permission prompts and missing hardware surface.
pub trait CameraBackend: Send {
    fn open(&mut self) -> Result<Box<dyn LiveStream>, Box<dyn std::error::Error>>;

    /// Human-readable device description for logs.
    fn describe(&self) -> String;
}

/// A bound, running video stream. Dropping it releases the device.
pub trait LiveStream: Send {
    /// Blocks until the next RGB frame is available.
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Releases any resources held by the stream. Default: rely on `Drop`.
    fn close(&mut self) {}
}
