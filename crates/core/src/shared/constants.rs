/// Fast face locator (BlazeFace short-range, 128x128 input).
pub const FACE_LOCATOR_MODEL_NAME: &str = "blazeface_short_range.onnx";

/// 68-point facial landmark regressor run on face crops.
pub const LANDMARK_MODEL_NAME: &str = "face_landmarks_68.onnx";

/// Directory name used under the platform config and cache directories.
pub const APP_DIR_NAME: &str = "EyewearTryOn";

/// Still frames are sampled at this size regardless of the camera resolution.
pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
