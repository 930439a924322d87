// ABOUTME: Configuration module for the clickcast editor
// ABOUTME: Persistent user settings and build configuration with environment variable handling

use crate::errors::{CastError, Result};
use crate::model::is_valid_speed;
use crate::utils;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FORMAT_VERSION: u32 = 1;

fn settings_version() -> u32 {
    SETTINGS_FORMAT_VERSION
}

/// User preferences shared by every project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(default = "settings_version")]
    pub version: u32,
    pub capture_key: String,
    pub default_width: u32,
    pub default_height: u32,
    pub default_speed: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            capture_key: "f7".to_string(),
            default_width: 800,
            default_height: 600,
            default_speed: 0.8,
        }
    }
}

/// Settings together with the file they live in. Every setter writes the file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = if path.exists() {
            info!("Loading settings from {:?}", path);
            let text = fs::read_to_string(path).map_err(|e| CastError::io(path, e))?;
            let settings: Settings =
                serde_json::from_str(&text).map_err(|source| CastError::ParseError {
                    path: path.to_path_buf(),
                    source,
                })?;
            if settings.version > SETTINGS_FORMAT_VERSION {
                return Err(CastError::UnsupportedVersion {
                    found: settings.version,
                    supported: SETTINGS_FORMAT_VERSION,
                });
            }
            if !is_valid_speed(settings.default_speed) {
                return Err(CastError::ValidationError {
                    path: path.to_path_buf(),
                    message: format!(
                        "defaultSpeed must be positive, got {}",
                        settings.default_speed
                    ),
                });
            }
            settings
        } else {
            info!("No settings file at {:?}, using defaults", path);
            Settings::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            settings,
        })
    }

    /// Load settings from the location given by the environment.
    pub fn from_env() -> Result<Self> {
        Self::load(&default_settings_path())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capture_key(&self) -> &str {
        &self.settings.capture_key
    }

    pub fn set_capture_key(&mut self, key: &str) -> Result<()> {
        self.settings.capture_key = key.to_lowercase();
        self.save()
    }

    pub fn set_default_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.settings.default_width = width;
        self.settings.default_height = height;
        self.save()
    }

    pub fn set_default_speed(&mut self, speed: f64) -> Result<()> {
        if !is_valid_speed(speed) {
            return Err(CastError::ValidationError {
                path: self.path.clone(),
                message: format!("default speed must be positive, got {}", speed),
            });
        }
        self.settings.default_speed = speed;
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        utils::ensure_parent_directory_exists(&self.path)?;
        let text = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.path, text).map_err(|e| CastError::io(&self.path, e))
    }
}

/// Where the settings file lives when nothing else is specified.
pub fn default_settings_path() -> PathBuf {
    if let Ok(dir) = env::var("CLICKCAST_CONFIG_DIR") {
        return PathBuf::from(dir).join("config.json");
    }
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir).join("clickcast").join("config.json");
        }
    }
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".config")
            .join("clickcast")
            .join("config.json"),
        Err(_) => {
            warn!("HOME is not set, keeping settings in the working directory");
            PathBuf::from("clickcast-config.json")
        }
    }
}

/// Names and locations used inside a project and its build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub project_file_name: String,
    pub image_dir_name: String,
    pub build_dir_name: String,
    pub html_file_name: String,
    /// Directory whose files replace the bundled runtime assets.
    pub resource_dir: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_file_name: "presentation.dahu".to_string(),
            image_dir_name: "img".to_string(),
            build_dir_name: "build".to_string(),
            html_file_name: "index.html".to_string(),
            resource_dir: None,
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let resource_dir = env::var("CLICKCAST_RESOURCE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        Self {
            resource_dir,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::load(&temp.path().join("config.json")).unwrap();
        assert_eq!(store.settings(), &Settings::default());
        assert_eq!(store.capture_key(), "f7");
    }

    #[test]
    fn test_setters_persist() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");

        let mut store = SettingsStore::load(&path).unwrap();
        store.set_capture_key("F9").unwrap();
        store.set_default_size(1024, 768).unwrap();
        store.set_default_speed(1.25).unwrap();

        let reloaded = SettingsStore::load(&path).unwrap();
        assert_eq!(reloaded.capture_key(), "f9");
        assert_eq!(reloaded.settings().default_width, 1024);
        assert_eq!(reloaded.settings().default_height, 768);
        assert_eq!(reloaded.settings().default_speed, 1.25);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"captureKey": "f8"}"#).unwrap();

        let store = SettingsStore::load(&path).unwrap();
        assert_eq!(store.capture_key(), "f8");
        assert_eq!(store.settings().default_width, 800);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SettingsStore::load(&path),
            Err(CastError::ParseError { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let temp = TempDir::new().unwrap();
        let mut store = SettingsStore::load(&temp.path().join("config.json")).unwrap();
        assert!(store.set_default_speed(0.0).is_err());
        assert!(store.set_default_speed(f64::INFINITY).is_err());
        assert_eq!(store.settings().default_speed, 0.8);
    }

    #[test]
    fn test_file_with_zero_speed_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"defaultSpeed": 0}"#).unwrap();

        let err = SettingsStore::load(&path).unwrap_err();
        assert!(matches!(err, CastError::ValidationError { .. }));
        assert!(err.to_string().contains("defaultSpeed"));
    }
}
