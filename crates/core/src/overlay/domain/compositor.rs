use crate::detection::domain::face_landmarks::LandmarkSet;
use crate::overlay::domain::overlay_asset::OverlayAsset;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::overlay::domain::placement::{compute_placement, Placement, PlacementError};
use crate::shared::frame::Frame;
use crate::shared::still_frame::StillFrame;

/// Why a composite does or does not carry an overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CompositeOutcome {
    Placed(Placement),
    NoFaceDetected,
    NoOverlaySelected,
}

/// The rendered surface for one still frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeResult {
    surface: Frame,
    outcome: CompositeOutcome,
}

impl CompositeResult {
    pub fn surface(&self) -> &Frame {
        &self.surface
    }

    pub fn into_surface(self) -> Frame {
        self.surface
    }

    pub fn outcome(&self) -> CompositeOutcome {
        self.outcome
    }

    pub fn placement(&self) -> Option<Placement> {
        match self.outcome {
            CompositeOutcome::Placed(p) => Some(p),
            _ => None,
        }
    }
}

/// Draws the selected overlay onto a copy of the pristine still frame.
pub struct OverlayCompositor {
    renderer: Box<dyn OverlayRenderer>,
}

impl OverlayCompositor {
    pub fn new(renderer: Box<dyn OverlayRenderer>) -> Self {
        Self { renderer }
    }

    /// Composites `asset` over the first face in `landmarks`.
    ///
    /// The still frame is never modified; each call starts from its pixels,
    /// so repeated calls never stack overlays. Without a face or an asset the
    /// surface is the unmodified still.
    pub fn composite(
        &self,
        still: &StillFrame,
        landmarks: &LandmarkSet,
        asset: Option<&OverlayAsset>,
    ) -> Result<CompositeResult, PlacementError> {
        let mut surface = still.to_frame();

        let Some(asset) = asset else {
            return Ok(CompositeResult {
                surface,
                outcome: CompositeOutcome::NoOverlaySelected,
            });
        };
        let Some(face) = landmarks.first() else {
            log::debug!("No face detected, overlay skipped");
            return Ok(CompositeResult {
                surface,
                outcome: CompositeOutcome::NoFaceDetected,
            });
        };

        let (left, right) = face.eye_anchors();
        let placement = compute_placement(
            left,
            right,
            f64::from(asset.width()),
            f64::from(asset.height()),
        )?;

        self.renderer
            .render(&mut surface, asset, &placement.rect)
            .map_err(|e| PlacementError::Render(e.to_string()))?;

        log::debug!(
            "Placed {} at ({:.1}, {:.1}) {:.1}x{:.1}, scale {:.3}",
            asset.uri(),
            placement.rect.x,
            placement.rect.y,
            placement.rect.width,
            placement.rect.height,
            placement.scale
        );

        Ok(CompositeResult {
            surface,
            outcome: CompositeOutcome::Placed(placement),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::shared::geometry::Rect;

    /// Paints the destination rectangle with the asset's first pixel colour.
    pub struct FillRenderer;

    impl OverlayRenderer for FillRenderer {
        fn render(
            &self,
            surface: &mut Frame,
            asset: &OverlayAsset,
            dest: &Rect,
        ) -> Result<(), Box<dyn std::error::Error>> {
            let rgb = [asset.rgba()[0], asset.rgba()[1], asset.rgba()[2]];
            let (w, h) = (surface.width() as f64, surface.height() as f64);
            let x0 = dest.x.max(0.0).round() as u32;
            let y0 = dest.y.max(0.0).round() as u32;
            let x1 = dest.right().min(w).round() as u32;
            let y1 = dest.bottom().min(h).round() as u32;
            let width = surface.width();
            let data = surface.data_mut();
            for y in y0..y1 {
                for x in x0..x1 {
                    let i = ((y * width + x) * 3) as usize;
                    data[i..i + 3].copy_from_slice(&rgb);
                }
            }
            Ok(())
        }
    }

    pub struct FailingRenderer;

    impl OverlayRenderer for FailingRenderer {
        fn render(
            &self,
            _surface: &mut Frame,
            _asset: &OverlayAsset,
            _dest: &Rect,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("surface lost".into())
        }
    }
}
