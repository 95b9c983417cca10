//! # Client Configuration
//!
//! Configuration management for the reporting client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_API_URL=https://pos.example.com                              │
//! │     TALLY_STORE=Q1                                                     │
//! │     TALLY_UTC_OFFSET_MINUTES=420                                       │
//! │     TALLY_MAX_RETRIES=3                                                │
//! │     TALLY_TOKEN=eyJhbGciOi...                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally-pos/client.toml (Linux)                            │
//! │     ~/Library/Application Support/tally-pos/client.toml (macOS)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost:5000, all stores, UTC+7, 3 retries                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [api]
//! base_url = "https://pos.example.com"
//! timeout_secs = 30
//! max_retries = 3
//! initial_backoff_ms = 1000
//!
//! [report]
//! store = "all"            # or a store code such as "Q1"
//! utc_offset_minutes = 420 # calendar used for days and hours
//! top_n = 10
//!
//! [session]
//! token_file = "/var/lib/tally/session.token"
//! ```

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tally_core::StoreFilter;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Largest retry budget accepted from configuration.
pub const MAX_RETRY_BUDGET: u32 = 10;

/// UTC offsets in the wild run from −12:00 to +14:00.
const MIN_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

const CONFIG_FILE: &str = "client.toml";
const TOKEN_FILE: &str = "session.token";

// =============================================================================
// API Settings
// =============================================================================

/// How to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the POS backend (http or https).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for reads. Mutations never retry.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay (milliseconds); doubles on every retry.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Ceiling for a single retry delay (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    1000
}
fn default_max_backoff() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

// =============================================================================
// Report Settings
// =============================================================================

/// Defaults for the report views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// `all` or a store code.
    #[serde(default = "default_store")]
    pub store: String,

    /// Offset of the store's local calendar from UTC, in minutes.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,

    /// Rows kept by the top products / top customers tables.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_store() -> String {
    StoreFilter::ALL.to_string()
}
fn default_utc_offset() -> i32 {
    7 * 60
}
fn default_top_n() -> usize {
    tally_core::grouping::DEFAULT_TOP_N
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            store: default_store(),
            utc_offset_minutes: default_utc_offset(),
            top_n: default_top_n(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Where the bearer token is persisted. Defaults to `session.token`
    /// next to the config file.
    #[serde(default)]
    pub token_file: Option<PathBuf>,

    /// Token supplied from the environment; never written back to disk.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub report: ReportSettings,

    #[serde(default)]
    pub session: SessionSettings,

    /// The file this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
            config.source = Some(path);
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load client config, using defaults");
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        self.base_url()?;

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.api.max_retries > MAX_RETRY_BUDGET {
            return Err(ClientError::InvalidConfig(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRY_BUDGET, self.api.max_retries
            )));
        }

        self.utc_offset()?;
        self.store_filter()?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from any variable source.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TALLY_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(store) = lookup("TALLY_STORE") {
            debug!(store = %store, "Overriding store from environment");
            self.report.store = store;
        }

        if let Some(offset) = lookup("TALLY_UTC_OFFSET_MINUTES") {
            match offset.trim().parse::<i32>() {
                Ok(minutes) => self.report.utc_offset_minutes = minutes,
                Err(_) => warn!(value = %offset, "Ignoring unparseable TALLY_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(retries) = lookup("TALLY_MAX_RETRIES") {
            match retries.trim().parse::<u32>() {
                Ok(n) => self.api.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring unparseable TALLY_MAX_RETRIES"),
            }
        }

        if let Some(token) = lookup("TALLY_TOKEN") {
            if !token.trim().is_empty() {
                debug!("Using session token from environment");
                self.session.token = Some(token.trim().to_string());
            }
        }
    }

    /// Returns the default config directory.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tally-pos").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parsed base URL. Only http and https are accepted.
    pub fn base_url(&self) -> ClientResult<Url> {
        let url = Url::parse(self.api.base_url.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidUrl(format!(
                "API URL must use http or https, got: {}",
                other
            ))),
        }
    }

    /// The store's local calendar offset.
    pub fn utc_offset(&self) -> ClientResult<FixedOffset> {
        let minutes = self.report.utc_offset_minutes;
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return Err(ClientError::InvalidConfig(format!(
                "utc_offset_minutes must be between {} and {}, got {}",
                MIN_OFFSET_MINUTES, MAX_OFFSET_MINUTES, minutes
            )));
        }
        FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            ClientError::InvalidConfig(format!("invalid utc_offset_minutes: {}", minutes))
        })
    }

    pub fn store_filter(&self) -> ClientResult<StoreFilter> {
        Ok(self.report.store.parse()?)
    }

    /// Where the session token lives.
    ///
    /// An explicit `token_file` wins, then the directory of the config file
    /// this was loaded from, then the default config dir.
    pub fn token_path(&self) -> Option<PathBuf> {
        self.session
            .token_file
            .clone()
            .or_else(|| self.source.as_deref().map(Self::token_path_near))
            .or_else(|| Self::config_dir().map(|dir| dir.join(TOKEN_FILE)))
    }

    /// Token file placed next to an explicit config file.
    pub fn token_path_near(config_path: &Path) -> PathBuf {
        config_path
            .parent()
            .map(|dir| dir.join(TOKEN_FILE))
            .unwrap_or_else(|| PathBuf::from(TOKEN_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.api.initial_backoff_ms, 1000);
        assert_eq!(config.report.store, "all");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://pos.example.com".into();
        assert!(config.validate().unwrap_err().is_config_error());

        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.api.base_url = "https://pos.example.com".into();
        assert!(config.validate().is_ok());

        config.api.max_retries = 11;
        assert!(config.validate().is_err());
        config.api.max_retries = 0;

        config.report.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());
        config.report.utc_offset_minutes = -5 * 60;
        assert!(config.validate().is_ok());

        config.report.store = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides(vars(&[
            ("TALLY_API_URL", "https://pos.example.com"),
            ("TALLY_STORE", "Q1"),
            ("TALLY_UTC_OFFSET_MINUTES", "-300"),
            ("TALLY_MAX_RETRIES", "oops"),
            ("TALLY_TOKEN", " abc "),
        ]));

        assert_eq!(config.api.base_url, "https://pos.example.com");
        assert_eq!(config.store_filter().unwrap(), StoreFilter::Store("Q1".into()));
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), -300 * 60);
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.session.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ClientConfig::default();
        config.session.token = Some("secret".into());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[report]"));
        assert!(!toml_str.contains("secret"));

        let parsed: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.api, config.api);
        assert_eq!(parsed.session.token, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: ClientConfig = toml::from_str("[report]\nstore = \"Q3\"\n").unwrap();
        assert_eq!(parsed.report.store, "Q3");
        assert_eq!(parsed.report.top_n, 10);
        assert_eq!(parsed.api, ApiSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("client.toml");

        let mut config = ClientConfig::default();
        config.report.store = "Q2".into();
        config.save(Some(path.clone())).unwrap();

        let loaded: ClientConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.report.store, "Q2");
        assert_eq!(loaded.source, None);
    }

    #[test]
    fn test_token_lives_next_to_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "[report]\nstore = \"Q1\"\n").unwrap();

        let config = ClientConfig::load(Some(path.clone())).unwrap();
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
        assert_eq!(config.token_path(), Some(dir.path().join("session.token")));

        let mut pinned = config.clone();
        pinned.session.token_file = Some(dir.path().join("other.token"));
        assert_eq!(pinned.token_path(), Some(dir.path().join("other.token")));
    }
}
