use thiserror::Error;

use crate::overlay::domain::overlay_asset::OverlayAsset;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to load overlay {uri}: {reason}")]
pub struct AssetError {
    pub uri: String,
    pub reason: String,
}

/// Fetches and decodes an overlay image. Completes before any drawing starts.
pub trait AssetLoader: Send {
    fn load(&self, uri: &str) -> Result<OverlayAsset, Box<dyn std::error::Error>>;
}
