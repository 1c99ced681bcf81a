pub mod execution_provider;
pub mod math;
pub mod model_resolver;
pub mod onnx_blazeface_locator;
pub mod onnx_landmark_model;
pub mod onnx_model_loader;
