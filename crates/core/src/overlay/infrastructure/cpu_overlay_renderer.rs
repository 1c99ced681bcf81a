use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::overlay::domain::overlay_asset::OverlayAsset;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::frame::Frame;
use crate::shared::geometry::Rect;

/// CPU renderer: resamples the asset to the destination size and alpha-blends
/// it over the RGB surface. The destination is clipped to the surface first;
/// destinations much larger than the surface are sampled per visible pixel.
pub struct CpuOverlayRenderer {
    filter: FilterType,
}

impl CpuOverlayRenderer {
    pub fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for CpuOverlayRenderer {
    fn default() -> Self {
        Self::new(FilterType::Triangle)
    }
}

impl OverlayRenderer for CpuOverlayRenderer {
    fn render(
        &self,
        surface: &mut Frame,
        asset: &OverlayAsset,
        dest: &Rect,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if surface.channels() != 3 || !surface.is_well_formed() {
            return Err(format!(
                "surface must be a well-formed RGB frame, got {} channels",
                surface.channels()
            )
            .into());
        }

        if ![dest.x, dest.y, dest.width, dest.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err("overlay rectangle is not finite".into());
        }
        if asset.width() == 0 || asset.height() == 0 {
            return Ok(());
        }

        // Snap edges rather than size so adjacent placements stay consistent.
        let left = dest.x.round();
        let top = dest.y.round();
        let dest_w = dest.right().round() - left;
        let dest_h = dest.bottom().round() - top;

        let (fw, fh) = (surface.width(), surface.height());
        let Some(visible) = visible_span(left, top, left + dest_w, top + dest_h, fw, fh) else {
            return Ok(());
        };

        let frame_area = f64::from(fw) * f64::from(fh);
        match (to_u32(dest_w), to_u32(dest_h)) {
            (Some(w), Some(h)) if dest_w * dest_h <= frame_area * MAX_RESAMPLE_FACTOR => {
                let source =
                    RgbaImage::from_raw(asset.width(), asset.height(), asset.rgba().to_vec())
                        .ok_or("overlay buffer does not match its size")?;
                let scaled = imageops::resize(&source, w, h, self.filter);
                // The visible span lies inside the destination, so both offsets are in range.
                let (ox, oy) = (left as i64, top as i64);
                blend_visible(surface, &visible, |x, y| {
                    scaled
                        .get_pixel((i64::from(x) - ox) as u32, (i64::from(y) - oy) as u32)
                        .0
                });
            }
            _ => {
                // Destination far larger than the frame: sample only what is visible.
                let (aw, ah) = (asset.width(), asset.height());
                let (step_x, step_y) = (f64::from(aw) / dest_w, f64::from(ah) / dest_h);
                let rgba = asset.rgba();
                blend_visible(surface, &visible, |x, y| {
                    let sx = (((f64::from(x) + 0.5 - left) * step_x) as u32).min(aw - 1);
                    let sy = (((f64::from(y) + 0.5 - top) * step_y) as u32).min(ah - 1);
                    let i = (sy as usize * aw as usize + sx as usize) * 4;
                    [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
                });
            }
        }

        Ok(())
    }
}

/// Destinations larger than this many frames' worth of pixels are sampled
/// per visible pixel instead of resampled as a whole.
const MAX_RESAMPLE_FACTOR: f64 = 4.0;

/// Frame pixels covered by the destination, as half-open ranges.
struct Span {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

fn visible_span(left: f64, top: f64, right: f64, bottom: f64, fw: u32, fh: u32) -> Option<Span> {
    let x0 = left.max(0.0);
    let y0 = top.max(0.0);
    let x1 = right.min(f64::from(fw));
    let y1 = bottom.min(f64::from(fh));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Span {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}

fn to_u32(v: f64) -> Option<u32> {
    if v >= 1.0 && v <= f64::from(u32::MAX) {
        Some(v as u32)
    } else {
        None
    }
}

/// Alpha-blends `sample(x, y)` over every frame pixel in `span`.
fn blend_visible(surface: &mut Frame, span: &Span, sample: impl Fn(u32, u32) -> [u8; 4]) {
    let fw = surface.width() as usize;
    let data = surface.data_mut();
    for y in span.y0..span.y1 {
        for x in span.x0..span.x1 {
            let px = sample(x, y);
            let alpha = u32::from(px[3]);
            if alpha == 0 {
                continue;
            }
            let offset = (y as usize * fw + x as usize) * 3;
            for c in 0..3 {
                let over = u32::from(px[c]);
                let under = u32::from(data[offset + c]);
                data[offset + c] = ((over * alpha + under * (255 - alpha) + 127) / 255) as u8;
            }
        }
    }
}
