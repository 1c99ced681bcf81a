use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::constants::{
    APP_DIR_NAME, DEFAULT_CONFIDENCE, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
};

/// Persistent user settings for the try-on pipeline.
///
/// Every field has a default so partially written files still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnSettings {
    /// Device path or index understood by the platform capture backend.
    pub camera_device: String,
    /// libavdevice input format; `None` picks the platform default.
    pub camera_format: Option<String>,
    pub frame_width: u32,
    pub frame_height: u32,
    pub confidence: f64,
    /// Directory searched for model files before downloading.
    pub models_dir: Option<PathBuf>,
    /// Base URL model files are downloaded from, as `{base}/{name}`.
    pub model_base_url: Option<String>,
}

impl Default for TryOnSettings {
    fn default() -> Self {
        Self {
            camera_device: default_camera_device().to_string(),
            camera_format: None,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            confidence: DEFAULT_CONFIDENCE,
            models_dir: Some(PathBuf::from("models")),
            model_base_url: None,
        }
    }
}

fn default_camera_device() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "/dev/video0"
    }
    #[cfg(target_os = "windows")]
    {
        "video=Integrated Camera"
    }
    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        "0"
    }
}

impl TryOnSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads settings from the platform config directory, falling back to defaults.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_use_standard_frame_size() {
        let settings = TryOnSettings::default();
        assert_eq!(settings.frame_width, 640);
        assert_eq!(settings.frame_height, 480);
        assert!(settings.model_base_url.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = TryOnSettings::load_from(&tmp.path().join("absent.json"));
        assert_eq!(settings, TryOnSettings::default());
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(TryOnSettings::load_from(&path), TryOnSettings::default());
    }

    #[test]
    fn test_partial_file_fills_remaining_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, r#"{"confidence": 0.8, "camera_device": "/dev/video2"}"#).unwrap();

        let settings = TryOnSettings::load_from(&path);
        assert_eq!(settings.camera_device, "/dev/video2");
        assert!((settings.confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(settings.frame_width, 640);
    }

    #[test]
    fn test_save_then_load_preserves_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let settings = TryOnSettings {
            model_base_url: Some("https://models.example.test/v1".into()),
            frame_width: 320,
            ..TryOnSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(TryOnSettings::load_from(&path), settings);
    }
}
