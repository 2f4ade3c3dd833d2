use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub assets: AssetConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Remote trivia API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opentdb.com/api.php".to_string(),
        }
    }
}

/// Static asset server serving images and sounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub base_url: String,
    pub sounds_prefix: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            sounds_prefix: "/sounds".to_string(),
        }
    }
}

/// Where persisted flags such as the mute state live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("trivia-quiz").join("storage.json"),
        }
    }
}
