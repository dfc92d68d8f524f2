// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SETTINGS_PATH: &str = "CO2_SETTINGS_PATH";
pub const DEFAULT_SETTINGS_PATH: &str = "config/co2.toml";

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_DATA_PATH: &str = "data/co2.json";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

/// Non-secret runtime settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Where the batch updater writes and the display service reads the static reading.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            data_path: default_data_path(),
        }
    }
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let s: Settings = toml::from_str(&content)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        Ok(s)
    }

    /// 1) $CO2_SETTINGS_PATH (must exist)
    /// 2) config/co2.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_SETTINGS_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_SETTINGS_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let p = PathBuf::from(DEFAULT_SETTINGS_PATH);
        if p.exists() {
            return Self::load_from(&p);
        }
        Ok(Self::default())
    }
}
