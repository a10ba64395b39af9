//! Configuration loading, validation, and management for Spiro.
//!
//! Loads configuration from `~/.spiro/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use spiro_core::PageLimits;
use std::path::{Path, PathBuf};

/// Store backends understood by `spiro-store`.
pub const STORE_BACKENDS: &[&str] = &["memory", "sqlite"];

/// The root configuration structure.
///
/// Maps directly to `~/.spiro/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Comment store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Page size defaults and caps
    #[serde(default)]
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "memory" or "sqlite"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (ignored by the memory backend)
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    AppConfig::config_dir()
        .join("comments.sqlite")
        .to_string_lossy()
        .into_owned()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Replies per primary comment when a request does not say
    #[serde(default = "default_sub_comment_count")]
    pub default_sub_comment_count: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_primary_comment_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_sub_comment_count: Option<u64>,

    /// Hold a lock around each store read
    #[serde(default)]
    pub serialize_store_reads: bool,
}

fn default_sub_comment_count() -> i64 {
    20
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_sub_comment_count: default_sub_comment_count(),
            max_primary_comment_count: None,
            max_sub_comment_count: None,
            serialize_store_reads: false,
        }
    }
}

impl PaginationConfig {
    pub fn limits(&self) -> PageLimits {
        PageLimits {
            max_primary_count: self.max_primary_comment_count,
            max_sub_count: self.max_sub_comment_count,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.spiro/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SPIRO_STORE_BACKEND`
    /// - `SPIRO_STORE_PATH`
    /// - `SPIRO_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides read through `lookup` (normally `std::env::var`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("SPIRO_STORE_BACKEND") {
            self.store.backend = backend;
        }
        if let Some(path) = lookup("SPIRO_STORE_PATH") {
            self.store.path = path;
        }
        if let Some(port) = lookup("SPIRO_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("SPIRO_PORT is not a valid port: {port}"))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".spiro")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be one of {STORE_BACKENDS:?}, got \"{}\"",
                self.store.backend
            )));
        }

        if self.store.backend == "sqlite" && self.store.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "store.path must be set for the sqlite backend".into(),
            ));
        }

        let pagination = &self.pagination;
        if pagination.default_sub_comment_count < 0 {
            return Err(ConfigError::ValidationError(
                "pagination.default_sub_comment_count must be >= 0".into(),
            ));
        }

        if let Some(max) = pagination.max_sub_comment_count
            .filter(|max| pagination.default_sub_comment_count as u64 > *max)
        {
            return Err(ConfigError::ValidationError(format!(
                "pagination.default_sub_comment_count exceeds max_sub_comment_count ({max})"
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `spiro config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.store.backend, "sqlite");
        assert!(config.store.path.ends_with("comments.sqlite"));
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.pagination.default_sub_comment_count, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.store.backend, config.store.backend);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(
            parsed.pagination.default_sub_comment_count,
            config.pagination.default_sub_comment_count
        );
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[store]
backend = "memory"

[pagination]
max_primary_comment_count = 128
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.pagination.default_sub_comment_count, 20);
        assert_eq!(config.pagination.limits().max_primary_count, Some(128));
        assert_eq!(config.pagination.limits().max_sub_count, None);
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "redis".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_default_sub_count_rejected() {
        let mut config = AppConfig::default();
        config.pagination.default_sub_comment_count = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_sub_count_above_cap_rejected() {
        let mut config = AppConfig::default();
        config.pagination.max_sub_comment_count = Some(10);
        assert!(config.validate().is_err());

        config.pagination.default_sub_comment_count = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().store.backend, "sqlite");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway]\nport = 9191\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gateway.port, 9191);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SPIRO_STORE_BACKEND", "memory"),
            ("SPIRO_STORE_PATH", "/var/lib/spiro/db.sqlite"),
            ("SPIRO_PORT", "9000"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.store.path, "/var/lib/spiro/db.sqlite");
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn bad_port_override_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "SPIRO_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("sqlite"));
        assert!(toml_str.contains("8080"));
        assert!(toml_str.contains("default_sub_comment_count = 20"));
    }
}
