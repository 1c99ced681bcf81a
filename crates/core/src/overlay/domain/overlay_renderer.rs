use crate::overlay::domain::overlay_asset::OverlayAsset;
use crate::shared::frame::Frame;
use crate::shared::geometry::Rect;

/// Draws an overlay asset into a surface at a destination rectangle.
///
/// Implementations modify `surface` in place; callers pass a fresh copy of
/// the still frame so earlier overlays never accumulate.
pub trait OverlayRenderer: Send {
    fn render(
        &self,
        surface: &mut Frame,
        asset: &OverlayAsset,
        dest: &Rect,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
