use thiserror::Error;

use crate::shared::geometry::{Point, Rect};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("degenerate placement: {0}")]
    Degenerate(String),
    #[error("failed to render overlay: {0}")]
    Render(String),
}

/// Where and how large the overlay is drawn on the still frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub rect: Rect,
    /// Ratio of rendered width to the asset's intrinsic width.
    pub scale: f64,
}

/// Anchors the overlay between the two eye points.
///
/// The overlay spans from `left.x` to `right.x` and is scaled uniformly, so
/// its aspect ratio is preserved. It is centered vertically on `left.y` and
/// never rotated, even when the eyes are at different heights.
pub fn compute_placement(
    left: Point,
    right: Point,
    intrinsic_width: f64,
    intrinsic_height: f64,
) -> Result<Placement, PlacementError> {
    if !left.is_finite() || !right.is_finite() {
        return Err(PlacementError::Degenerate(
            "eye anchors are not finite".into(),
        ));
    }
    if !(intrinsic_width.is_finite() && intrinsic_width > 0.0)
        || !(intrinsic_height.is_finite() && intrinsic_height > 0.0)
    {
        return Err(PlacementError::Degenerate(format!(
            "overlay has no usable size ({intrinsic_width}x{intrinsic_height})"
        )));
    }

    let eye_width = right.x - left.x;
    if eye_width <= 0.0 {
        return Err(PlacementError::Degenerate(format!(
            "eye width {eye_width} is not positive"
        )));
    }

    let scale = eye_width / intrinsic_width;
    let render_height = intrinsic_height * scale;
    let rect = Rect::new(left.x, left.y - render_height / 2.0, eye_width, render_height);

    Ok(Placement { rect, scale })
}
