//! Settings model and JSON persistence.
//! Paths are threaded in explicitly; nothing here reads ambient global state
//! beyond the user data directory used for the default locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Directory name under the user data dir holding config and cache.
const DATA_DIR_NAME: &str = "colloq";
/// Config file name inside the data directory.
const CONFIG_FILE_NAME: &str = "config.json";
/// Durable translation cache file name inside the data directory.
const CACHE_FILE_NAME: &str = "translation_cache.db";

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_PROMPT: &str =
    "请将以下中文翻译成自然、口语化的英文，适合在聊天、论坛等非正式场合使用。\
     保持原意的同时，让表达更加地道和自然：";

/// Immutable settings snapshot carried by each query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
            prompt: default_prompt(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config IO error: {e}"),
            ConfigError::Serialize(e) => write!(f, "config serialize error: {e}"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl Settings {
    /// Whether a usable API credential is configured.
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Load settings from `path`. Missing fields take their defaults; a
    /// missing or unreadable file falls back to all defaults so a fresh
    /// install still answers queries (with a config-missing decision).
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config parse failed, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist settings as pretty JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Default config file location under the user data directory.
pub fn default_config_path() -> PathBuf {
    data_dir().join(CONFIG_FILE_NAME)
}

/// Durable cache location next to the given config file.
pub fn cache_path_for(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.join(CACHE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CACHE_FILE_NAME))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let settings = Settings {
            api_url: "https://api.example.com/v1/chat/completions".to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            prompt: "translate:".to_string(),
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.api_url, settings.api_url);
        assert_eq!(loaded.api_key, settings.api_key);
        assert_eq!(loaded.model, settings.model);
        assert_eq!(loaded.prompt, settings.prompt);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = Settings::load(&dir.path().join("absent.json"));
        assert_eq!(loaded.api_url, DEFAULT_API_URL);
        assert!(!loaded.has_credential());
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "sk-partial"}"#).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.api_key, "sk-partial");
        assert_eq!(loaded.model, DEFAULT_MODEL);
        assert_eq!(loaded.prompt, DEFAULT_PROMPT);
        assert!(loaded.has_credential());
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json {").unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.model, DEFAULT_MODEL);
    }

    #[test]
    fn blank_credential_does_not_count() {
        let settings = Settings {
            api_key: "   ".to_string(),
            ..Settings::default()
        };
        assert!(!settings.has_credential());
    }

    #[test]
    fn cache_path_sits_next_to_config() {
        let config = PathBuf::from("/tmp/colloq/config.json");
        assert_eq!(
            cache_path_for(&config),
            PathBuf::from("/tmp/colloq/translation_cache.db")
        );
    }
}
