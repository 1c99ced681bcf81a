use std::fs;
use std::path::{Path, PathBuf};

use crate::overlay::domain::asset_loader::AssetLoader;
use crate::overlay::domain::overlay_asset::OverlayAsset;

/// Loads overlay images from local paths, `file://` URIs or `http(s)://` URLs
/// and decodes them to RGBA.
///
/// Relative paths are resolved against `base_dir` when one is set, so product
/// lists can reference images next to themselves.
#[derive(Default)]
pub struct ImageAssetLoader {
    base_dir: Option<PathBuf>,
}

impl ImageAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn local_path(&self, uri: &str) -> PathBuf {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn fetch(&self, uri: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        if is_remote(uri) {
            log::debug!("Downloading overlay {uri}");
            let bytes = reqwest::blocking::get(uri)?.error_for_status()?.bytes()?;
            Ok(bytes.to_vec())
        } else {
            Ok(fs::read(self.local_path(uri))?)
        }
    }
}

impl AssetLoader for ImageAssetLoader {
    fn load(&self, uri: &str) -> Result<OverlayAsset, Box<dyn std::error::Error>> {
        let bytes = self.fetch(uri)?;
        let image = image::load_from_memory(&bytes)?.into_rgba8();
        let (width, height) = image.dimensions();
        log::info!("Loaded overlay {uri} ({width}x{height})");
        Ok(OverlayAsset::new(uri, width, height, image.into_raw())?)
    }
}

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}
