//! # Terminal Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (highest priority)                                    │
//! │     --store store-001                                                  │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     TILLPOINT_STORE_ID=store-001                                       │
//! │     TILLPOINT_API_URL=https://pos.example.com/api/v1                   │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/pos/terminal.toml (Linux)                                │
//! │     ~/Library/Application Support/com.tillpoint.pos/terminal.toml      │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! id = "store-001"
//! name = "Harbour Street"
//!
//! [api]
//! base_url = "https://pos.example.com/api/v1"
//! token = "..."
//! page_size = 1000
//!
//! [cache]
//! ttl_secs = 300
//! background_refresh_secs = 60
//!
//! [scanner]
//! dedup_window_ms = 250
//! beep = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tillpoint_core::validation::validate_store_id;
use tillpoint_inventory::{ApiSettings, CacheSettings};
use tillpoint_scanner::ScannerSettings;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Store Configuration
// =============================================================================

/// The store this terminal sells for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_id")]
    pub id: String,

    #[serde(default)]
    pub name: String,
}

fn default_store_id() -> String {
    "default-store".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            id: default_store_id(),
            name: "Default Store".to_string(),
        }
    }
}

// =============================================================================
// Main Terminal Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    ///
    /// Does not validate: command-line overrides still apply on top, so the
    /// caller runs [`validate`](Self::validate) once they are in.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path.or_else(Self::default_config_path);
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    fn load_with(path: Option<&Path>, var: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(var);
        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;
        let write_error = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(write_error)?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_store_id(&self.store.id)?;
        self.api.validate()?;
        self.cache.validate()?;
        self.scanner.validate().map_err(ConfigError::Scanner)?;
        Ok(())
    }

    /// Applies environment variable overrides.
    ///
    /// Takes the lookup as a function so tests do not touch the process
    /// environment.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("TILLPOINT_STORE_ID") {
            debug!(store_id = %id, "Overriding store ID from environment");
            self.store.id = id;
        }

        if let Some(url) = var("TILLPOINT_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(token) = var("TILLPOINT_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Some(ttl) = var("TILLPOINT_CACHE_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(secs) => self.cache.ttl_secs = secs,
                Err(_) => warn!(value = %ttl, "Ignoring invalid TILLPOINT_CACHE_TTL_SECS"),
            }
        }

        if let Some(window) = var("TILLPOINT_DEDUP_WINDOW_MS") {
            match window.parse::<u64>() {
                Ok(ms) => self.scanner.dedup_window_ms = ms,
                Err(_) => warn!(value = %window, "Ignoring invalid TILLPOINT_DEDUP_WINDOW_MS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tillpoint", "pos")
            .map(|dirs| dirs.config_dir().join("terminal.toml"))
    }

    pub fn store_id(&self) -> &str {
        self.store.id.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TerminalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.scanner.dedup_window_ms, 250);
    }

    #[test]
    fn test_parse_file() {
        let config: TerminalConfig = toml::from_str(
            r#"
            [store]
            id = "store-001"

            [api]
            base_url = "https://pos.example.com/api/v1"
            token = "secret"

            [scanner]
            beep = false
            "#,
        )
        .unwrap();

        assert_eq!(config.store_id(), "store-001");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.api.page_size, 1000);
        assert!(!config.scanner.beep);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TerminalConfig::default();
        config.apply_env_overrides(env(&[
            ("TILLPOINT_STORE_ID", "store-9"),
            ("TILLPOINT_API_URL", "https://other.example.com"),
            ("TILLPOINT_CACHE_TTL_SECS", "60"),
            ("TILLPOINT_DEDUP_WINDOW_MS", "not-a-number"),
        ]));

        assert_eq!(config.store.id, "store-9");
        assert_eq!(config.api.base_url, "https://other.example.com");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.scanner.dedup_window_ms, 250);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TerminalConfig::default();
        config.store.id = "a b".into();
        assert!(matches!(config.validate(), Err(ConfigError::Store(_))));

        let mut config = TerminalConfig::default();
        config.api.base_url = "ftp://x".into();
        assert!(config.validate().is_err());

        let mut config = TerminalConfig::default();
        config.scanner.dedup_window_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Scanner(_))));
    }

    #[test]
    fn test_load_defers_validation_to_overrides() {
        let dir = std::env::temp_dir().join(format!("tillpoint-load-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("terminal.toml");
        std::fs::write(&path, "[store]\nid = \"store 1\"\n").unwrap();

        // A bad id from the file or environment does not abort the load.
        let mut config = TerminalConfig::load_with(Some(&path), env(&[])).unwrap();
        assert!(config.validate().is_err());

        let mut from_env =
            TerminalConfig::load_with(None, env(&[("TILLPOINT_STORE_ID", "../x")])).unwrap();
        assert!(from_env.validate().is_err());

        // --store fixes both.
        config.store.id = "store-1".into();
        from_env.store.id = "store-1".into();
        assert!(config.validate().is_ok());
        assert!(from_env.validate().is_ok());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = std::env::temp_dir().join(format!("tillpoint-parse-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("terminal.toml");
        std::fs::write(&path, "[store\nid = 1").unwrap();

        assert!(matches!(
            TerminalConfig::load_with(Some(&path), env(&[])),
            Err(ConfigError::Parse(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("tillpoint-test-{}", std::process::id()));
        let path = dir.join("terminal.toml");

        let mut config = TerminalConfig::default();
        config.store.id = "store-42".into();
        config.save(Some(path.clone())).unwrap();

        let loaded: TerminalConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.store.id, "store-42");

        std::fs::remove_dir_all(&dir).ok();
    }
}
