//! Application configuration management.
//!
//! Configuration is stored at `~/.config/lawcache/config.json` and falls
//! back to built-in defaults when the file is absent. The API base URL
//! can be overridden with the `LAWCACHE_API_URL` environment variable
//! (loaded from `.env` when present).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::Difficulty;

/// Application name used for config/store directory paths
const APP_NAME: &str = "lawcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
const API_URL_ENV: &str = "LAWCACHE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub quiz: QuizConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Question snapshot is stale past this age
    pub max_age_hours: i64,
    /// Below this count the cache wants a sync
    pub min_questions: usize,
    /// Snapshot never grows past this; oldest entries drop on merge
    pub max_questions: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            min_questions: 20,
            max_questions: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuizConfig {
    pub default_difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_hours: i64,
    pub background_sync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: 6,
            background_sync: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api.base_url = url;
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Location of the config file, whether or not it exists yet
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the persisted key/value store
    pub fn store_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("store"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.cache.max_age_hours, 24);
        assert_eq!(config.cache.min_questions, 20);
        assert_eq!(config.cache.max_questions, 100);
        assert_eq!(config.sync.interval_hours, 6);
        assert!(config.sync.enabled);
        assert!(config.sync.background_sync);
    }

    #[test]
    fn test_saved_form_round_trips() {
        // The pretty-printed form written by save() must load back intact
        let written = serde_json::to_string_pretty(&AppConfig::default()).expect("serialize");
        let loaded: AppConfig = serde_json::from_str(&written).expect("parse");
        assert_eq!(loaded.api.base_url, "http://localhost:3000");
        assert_eq!(loaded.quiz.default_difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"api": {"base_url": "https://quiz.example.com"}}"#;
        let config: AppConfig = serde_json::from_str(json).expect("parse config");
        assert_eq!(config.api.base_url, "https://quiz.example.com");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.cache.max_questions, 100);
    }
}
