//! # Configuration
//!
//! Server settings are read from a YAML file (`school-admin.yaml` by default,
//! or the path in `SCHOOL_ADMIN_CONFIG`). A missing file means defaults. A
//! handful of environment variables override the file so deployments can keep
//! secrets out of it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_PATH_ENV: &str = "SCHOOL_ADMIN_CONFIG";
pub const DATABASE_URL_ENV: &str = "SCHOOL_ADMIN_DATABASE_URL";
pub const BIND_ADDRESS_ENV: &str = "SCHOOL_ADMIN_BIND";
pub const ASSISTANT_API_KEY_ENV: &str = "SCHOOL_ADMIN_ASSISTANT_API_KEY";

const DEFAULT_CONFIG_FILE: &str = "school-admin.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub cors_origin: String,
    pub upload_dir: PathBuf,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    pub uploads: UploadConfig,
    pub assistant: AssistantConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:school_admin.db".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:8080".to_string(),
            upload_dir: PathBuf::from("uploads"),
            log_level: "info".to_string(),
            uploads: UploadConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// Size ceilings for stored images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub general_max_bytes: usize,
    pub compact_max_bytes: usize,
    /// Longest edge after resizing
    pub max_dimension: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            general_max_bytes: 20 * 1024,
            compact_max_bytes: 5 * 1024,
            max_dimension: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Messages kept per session, excluding the system prompt
    pub max_history: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_history: 20,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a YAML file; a missing file yields the defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&yaml_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        if yaml_content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml_content)?)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.database_url = url;
        }
        if let Some(addr) = lookup(BIND_ADDRESS_ENV) {
            self.bind_address = addr;
        }
        if let Some(key) = lookup(ASSISTANT_API_KEY_ENV) {
            self.assistant.api_key = Some(key);
        }
    }
}
