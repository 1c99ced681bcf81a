//! 68-point face landmarks and the per-frame detection result.
//!
//! Index ranges follow the iBUG 300-W layout. The "left" eye is the one on
//! the left of the image (the subject's right eye), so its first point is the
//! leftmost eye corner in a frontal capture.

use std::ops::Range;

use crate::shared::geometry::Point;

pub const LANDMARK_COUNT: usize = 68;

const LEFT_EYE: Range<usize> = 36..42;
const RIGHT_EYE: Range<usize> = 42..48;

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Point>,
    score: f64,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>, score: f64) -> Result<Self, String> {
        if points.len() != LANDMARK_COUNT {
            return Err(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                points.len()
            ));
        }
        Ok(Self { points, score })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Confidence of the face locator for this face.
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn left_eye(&self) -> &[Point] {
        &self.points[LEFT_EYE]
    }

    pub fn right_eye(&self) -> &[Point] {
        &self.points[RIGHT_EYE]
    }

    /// First point of each eye cluster: `(left, right)`.
    pub fn eye_anchors(&self) -> (Point, Point) {
        (self.left_eye()[0], self.right_eye()[0])
    }
}

/// Faces found in one still frame, in detector order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkSet {
    faces: Vec<FaceLandmarks>,
}

impl LandmarkSet {
    pub fn new(faces: Vec<FaceLandmarks>) -> Self {
        Self { faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn faces(&self) -> &[FaceLandmarks] {
        &self.faces
    }

    /// The face the overlay is placed on. Additional faces are ignored.
    pub fn first(&self) -> Option<&FaceLandmarks> {
        self.faces.first()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::landmarks_with_anchors;
    use super::*;
    use rstest::rstest;

    fn indexed_landmarks() -> FaceLandmarks {
        let points = (0..LANDMARK_COUNT)
            .map(|i| Point::new(i as f64, 100.0 + i as f64))
            .collect();
        FaceLandmarks::new(points, 0.75).unwrap()
    }

    #[rstest]
    #[case::too_few(5)]
    #[case::too_many(69)]
    #[case::empty(0)]
    fn test_new_rejects_wrong_point_count(#[case] count: usize) {
        let points = vec![Point::new(1.0, 1.0); count];
        assert!(FaceLandmarks::new(points, 0.5).is_err());
    }

    #[test]
    fn test_eye_slices_cover_six_points_each() {
        let lm = indexed_landmarks();
        assert_eq!(lm.left_eye().len(), 6);
        assert_eq!(lm.right_eye().len(), 6);
        assert_eq!(lm.left_eye()[0], Point::new(36.0, 136.0));
        assert_eq!(lm.left_eye()[5], Point::new(41.0, 141.0));
        assert_eq!(lm.right_eye()[0], Point::new(42.0, 142.0));
        assert_eq!(lm.right_eye()[5], Point::new(47.0, 147.0));
    }

    #[test]
    fn test_eye_anchors_are_first_points() {
        let lm = landmarks_with_anchors((200.0, 220.0), (260.0, 218.0));
        let (left, right) = lm.eye_anchors();
        assert_eq!(left, Point::new(200.0, 220.0));
        assert_eq!(right, Point::new(260.0, 218.0));
    }

    #[test]
    fn test_score_is_kept() {
        assert!((indexed_landmarks().score() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_set_has_no_first_face() {
        let set = LandmarkSet::empty();
        assert!(set.is_empty());
        assert!(set.first().is_none());
    }

    #[test]
    fn test_first_is_detector_order() {
        let a = landmarks_with_anchors((10.0, 10.0), (20.0, 10.0));
        let b = landmarks_with_anchors((300.0, 10.0), (340.0, 10.0));
        let set = LandmarkSet::new(vec![a.clone(), b]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), Some(&a));
    }
}
