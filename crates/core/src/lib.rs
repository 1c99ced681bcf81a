//! Landmark-driven eyewear try-on: capture a still from a camera, locate the
//! eyes, and composite a selected eyewear image between them.

pub mod capture;
pub mod catalog;
pub mod detection;
pub mod overlay;
pub mod pipeline;
pub mod shared;
