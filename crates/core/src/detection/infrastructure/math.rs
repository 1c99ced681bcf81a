//! Box overlap and score helpers for the face locator.

use std::cmp::Ordering;

use crate::detection::domain::face_locator::FaceBox;

fn area(b: &FaceBox) -> f64 {
    b.width().max(0.0) * b.height().max(0.0)
}

/// Intersection over union of two face boxes.
pub fn iou(a: &FaceBox, b: &FaceBox) -> f64 {
    let overlap_w = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let overlap_h = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let inter = overlap_w * overlap_h;
    if inter <= 0.0 {
        return 0.0;
    }
    inter / (area(a) + area(b) - inter)
}

/// Greedy non-maximum suppression.
///
/// Returns the surviving boxes ordered by score, highest first.
pub fn nms(mut boxes: Vec<FaceBox>, iou_thresh: f64) -> Vec<FaceBox> {
    boxes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<FaceBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        if kept.iter().all(|k| iou(k, &candidate) <= iou_thresh) {
            kept.push(candidate);
        }
    }
    kept
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
