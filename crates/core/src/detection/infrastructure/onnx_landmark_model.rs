//! 68-point landmark regressor using ONNX Runtime via `ort`.
//!
//! Runs on a padded square crop around each located face. The model emits
//! 136 values: interleaved `(x, y)` pairs normalized to the crop.

use std::path::Path;

use crate::detection::domain::face_landmarks::LANDMARK_COUNT;
use crate::detection::domain::face_locator::FaceBox;
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::shared::frame::Frame;
use crate::shared::geometry::Point;

use super::execution_provider::{build_session, static_input_size};

/// Fallback input resolution when the model input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 112;

/// Crop padding on each side, as a fraction of the longer face box side.
const CROP_PADDING: f64 = 0.1;

pub struct OnnxLandmarkModel {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxLandmarkModel {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let input_size = static_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl LandmarkModel for OnnxLandmarkModel {
    fn landmarks(
        &mut self,
        frame: &Frame,
        face: &FaceBox,
    ) -> Result<Vec<Point>, Box<dyn std::error::Error>> {
        let crop = face_crop(face, frame.width(), frame.height()).ok_or("face crop is empty")?;
        let input_tensor = crop_tensor(frame, &crop, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("landmark model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get landmark slice")?;

        decode_points(data, &crop)
    }
}

/// Crop rectangle in whole frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Crop {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Square crop centered on the face, padded, and clipped to the frame.
fn face_crop(face: &FaceBox, fw: u32, fh: u32) -> Option<Crop> {
    let side = face.width().max(face.height()) * (1.0 + 2.0 * CROP_PADDING);
    let cx = (face.x1 + face.x2) / 2.0;
    let cy = (face.y1 + face.y2) / 2.0;

    let x1 = (cx - side / 2.0).max(0.0).floor() as u32;
    let y1 = (cy - side / 2.0).max(0.0).floor() as u32;
    let x2 = ((cx + side / 2.0).min(fw as f64).ceil() as u32).min(fw);
    let y2 = ((cy + side / 2.0).min(fh as f64).ceil() as u32).min(fh);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Crop {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
    })
}

/// Nearest-neighbor resample of the crop to `size x size`, [0,1] NCHW float32.
fn crop_tensor(frame: &Frame, crop: &Crop, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let s = size as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = crop.y as usize
            + (((y as f64 + 0.5) * crop.height as f64 / s as f64) as usize)
                .min(crop.height as usize - 1);
        for x in 0..s {
            let src_x = crop.x as usize
                + (((x as f64 + 0.5) * crop.width as f64 / s as f64) as usize)
                    .min(crop.width as usize - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }
    tensor
}

fn decode_points(data: &[f32], crop: &Crop) -> Result<Vec<Point>, Box<dyn std::error::Error>> {
    if data.len() < LANDMARK_COUNT * 2 {
        return Err(format!(
            "landmark model produced {} values, expected {}",
            data.len(),
            LANDMARK_COUNT * 2
        )
        .into());
    }
    Ok(data
        .chunks_exact(2)
        .take(LANDMARK_COUNT)
        .map(|xy| {
            Point::new(
                crop.x as f64 + xy[0] as f64 * crop.width as f64,
                crop.y as f64 + xy[1] as f64 * crop.height as f64,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face(x1: f64, y1: f64, x2: f64, y2: f64) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            score: 0.9,
        }
    }

    #[test]
    fn test_crop_is_padded_square() {
        // 100x100 face, 10% padding per side -> 120x120 crop
        let crop = face_crop(&face(200.0, 150.0, 300.0, 250.0), 640, 480).unwrap();
        assert_eq!(
            crop,
            Crop {
                x: 190,
                y: 140,
                width: 120,
                height: 120
            }
        );
    }

    #[test]
    fn test_crop_uses_longer_side() {
        let crop = face_crop(&face(200.0, 100.0, 250.0, 200.0), 640, 480).unwrap();
        assert_eq!(crop.width, crop.height);
        assert_eq!(crop.height, 120);
    }

    #[test]
    fn test_crop_clipped_at_frame_edge() {
        let crop = face_crop(&face(0.0, 0.0, 100.0, 100.0), 640, 480).unwrap();
        assert_eq!(crop.x, 0);
        assert_eq!(crop.y, 0);
        assert_eq!(crop.width, 110);
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        assert!(face_crop(&face(700.0, 500.0, 720.0, 520.0), 640, 480).is_none());
    }

    #[test]
    fn test_crop_tensor_samples_crop_only() {
        // Left half black, right half white; crop the right half.
        let mut frame = Frame::filled(40, 20, [0, 0, 0], 0);
        {
            let mut arr = frame.as_ndarray_mut();
            for y in 0..20 {
                for x in 20..40 {
                    for c in 0..3 {
                        arr[[y, x, c]] = 255;
                    }
                }
            }
        }
        let crop = Crop {
            x: 20,
            y: 0,
            width: 20,
            height: 20,
        };
        let tensor = crop_tensor(&frame, &crop, 8);
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_decode_points_maps_into_crop() {
        let crop = Crop {
            x: 100,
            y: 50,
            width: 200,
            height: 100,
        };
        let mut data = vec![0.0f32; LANDMARK_COUNT * 2];
        data[36 * 2] = 0.25;
        data[36 * 2 + 1] = 0.5;
        let points = decode_points(&data, &crop).unwrap();
        assert_eq!(points.len(), LANDMARK_COUNT);
        assert_relative_eq!(points[36].x, 150.0);
        assert_relative_eq!(points[36].y, 100.0);
        assert_relative_eq!(points[0].x, 100.0);
    }

    #[test]
    fn test_decode_points_rejects_short_output() {
        let crop = Crop {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(decode_points(&[0.5; 10], &crop).is_err());
    }
}
