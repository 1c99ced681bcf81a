pub mod detector_lifecycle;
pub mod face_landmarks;
pub mod face_locator;
pub mod landmark_extractor;
pub mod landmark_model;
pub mod model_loader;
