use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;

use crate::data::{DEFAULT_API_URL, DEFAULT_GEOCODER_URL, DEFAULT_TILE_URL};

/// Settings read from `meeting-finder/config.toml` in the user config
/// directory. Every field falls back to the compiled-in default, so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub geocoder_url: String,
    pub tile_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("meeting-finder").join("config.toml"))
}

pub fn load() -> anyhow::Result<Config> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };

    if !path.exists() {
        log::debug!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    log::info!("loaded configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_every_default() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.tile_url, DEFAULT_TILE_URL);
    }

    #[test]
    fn partial_file_only_overrides_named_fields() {
        let config: Config = toml::from_str(r#"api_url = "https://meetings.example.org""#).unwrap();

        assert_eq!(config.api_url, "https://meetings.example.org");
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.tile_url, DEFAULT_TILE_URL);
    }
}
