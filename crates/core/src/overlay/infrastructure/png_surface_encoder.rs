use std::io::Cursor;

use image::{ImageFormat, RgbImage};

use crate::overlay::domain::surface_encoder::SurfaceEncoder;
use crate::shared::frame::Frame;

#[derive(Default)]
pub struct PngSurfaceEncoder;

impl SurfaceEncoder for PngSurfaceEncoder {
    fn encode(&self, surface: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if surface.channels() != 3 {
            return Err(format!("cannot encode {}-channel surface as RGB", surface.channels()).into());
        }
        let image = RgbImage::from_raw(surface.width(), surface.height(), surface.data().to_vec())
            .ok_or("surface buffer does not match its size")?;

        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
