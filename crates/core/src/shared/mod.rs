pub mod constants;
pub mod frame;
pub mod geometry;
pub mod settings;
pub mod still_frame;
