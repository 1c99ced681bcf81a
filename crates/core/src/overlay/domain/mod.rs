pub mod asset_loader;
pub mod compositor;
pub mod overlay_asset;
pub mod overlay_renderer;
pub mod placement;
pub mod surface_encoder;
