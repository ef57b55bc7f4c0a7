use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const APP_DIR: &str = "imadjust";
const CONFIG_FILE: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Worker threads for the processing engine; 0 picks one per core.
    pub threads: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EditorSettings {
    /// Render once more when the engine finishes loading after an image.
    pub rerun_on_engine_ready: bool,
    pub export_file_name: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            rerun_on_engine_ready: true,
            export_file_name: "adjusted-image.png".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSettings,
    pub editor: EditorSettings,
    pub window: WindowSettings,
}

impl Config {
    /// `<config dir>/imadjust/config.json`, when the platform has a config dir.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the user config, falling back to defaults when it is missing or
    /// unreadable.
    pub fn load() -> Config {
        let Some(path) = Self::path() else {
            log::debug!("no config directory on this platform, using defaults");
            return Config::default();
        };
        if !path.exists() {
            log::debug!("{} not found, using defaults", path.display());
            return Config::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("ignoring {}: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::default();
        config.engine.threads = 3;
        config.editor.rerun_on_engine_ready = false;
        config.editor.export_file_name = "out.png".to_string();
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "engine": { "threads": 4 } }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.engine.threads, 4);
        assert!(config.editor.rerun_on_engine_ready);
        assert_eq!(config.editor.export_file_name, "adjusted-image.png");
        assert_eq!(config.window, WindowSettings::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
