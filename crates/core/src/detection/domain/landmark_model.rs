use crate::detection::domain::face_locator::FaceBox;
use crate::shared::frame::Frame;
use crate::shared::geometry::Point;

/// Domain interface for the landmark-geometry sub-model.
///
/// Returns the 68 landmark points of the face inside `face`, in frame pixel
/// coordinates.
pub trait LandmarkModel: Send {
    fn landmarks(
        &mut self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<Vec<Point>, Box<dyn std::error::Error>>;
}
