use crate::shared::frame::Frame;

/// Encodes a rendered surface into a displayable image resource.
pub trait SurfaceEncoder: Send {
    fn encode(&self, surface: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>>;
}
