pub mod camera_backend;
pub mod capture_source;
