use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the platform API the lyrics endpoints live under.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Position tick interval. 100 ms (10 Hz) balances display smoothness
    /// against render cost.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

const fn default_tick_interval() -> u64 {
    crate::playback::DEFAULT_TICK_INTERVAL_MS
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Number of tracks whose fetched lyrics are kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

const fn default_cache_capacity() -> usize {
    crate::cache::DEFAULT_CACHE_CAPACITY
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] for a zero tick interval or a
    /// blank API base URL.
    pub fn validate(&self) -> Result<()> {
        if self.playback.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "playback.tick_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.api.base_url.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "api.base_url must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Load the config file at the default location, writing a commented
    /// template first when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be written or an existing
    /// file cannot be parsed.
    pub fn load_or_init() -> Result<Self> {
        let path = crate::paths::config_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, build_config_template())?;
            info!("Wrote config template to {:?}", path);
        }
        Self::load(&path)
    }
}

/// Build the default config file contents.
#[must_use]
pub fn build_config_template() -> &'static str {
    r##"[api]
# Base URL of the platform API (lyrics endpoints live under /api/music/)
base_url = "http://127.0.0.1:3000"
timeout_secs = 10
max_retries = 3

[playback]
# Position tick interval in milliseconds (100 = 10 Hz)
tick_interval_ms = 100

[lyrics]
# Number of tracks whose fetched lyrics are kept in memory
cache_capacity = 32
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.playback.tick_interval_ms, 100);
        assert_eq!(config.lyrics.cache_capacity, 32);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(build_config_template()).unwrap();
        assert_eq!(config.playback.tick_interval_ms, 100);
        assert_eq!(config.api.base_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_validate_rejects_zero_tick_interval() {
        let config: Config = toml::from_str("[playback]\ntick_interval_ms = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(CoreError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_base_url() {
        let config: Config = toml::from_str("[api]\nbase_url = \"  \"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(CoreError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("[api]\nbase_url = \"https://example.net\"\n").unwrap();
        assert_eq!(config.api.base_url, "https://example.net");
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.playback.tick_interval_ms, 100);
    }
}
