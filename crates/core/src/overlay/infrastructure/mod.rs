pub mod cpu_overlay_renderer;
pub mod image_asset_loader;
pub mod png_surface_encoder;
