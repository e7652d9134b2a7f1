//! Application configuration module
//!
//! `SyncConfig` carries every knob of the offline engine. It can be built
//! in code through `SyncConfig::builder()`, read from the environment, or
//! loaded from a TOML file:
//!
//! ```toml
//! server_url = "https://tasks.example.com"
//! sync_interval_secs = 60
//! log_retention = "discard"
//! mount_point = "sync-status"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default server URL
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
/// Default task collection endpoint
pub const DEFAULT_TASKS_PATH: &str = "/api/tasks";
/// Default health endpoint used by the connectivity probe
pub const DEFAULT_HEALTH_PATH: &str = "/api/health";
/// Default storage namespace
pub const DEFAULT_NAMESPACE: &str = "tasksync";

/// What happens to the pending mutation log after a successful sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRetention {
    /// Keep every record; the snapshot replaced the cache but nothing was
    /// replayed, so the records are kept for inspection
    #[default]
    Retain,
    /// Clear the log once the snapshot has replaced the cache
    #[serde(alias = "discard")]
    DiscardOnSync,
}

/// Configuration of the offline sync engine
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub server_url: String,
    pub tasks_path: String,
    pub health_path: String,
    pub sync_interval: Duration,
    pub status_refresh_interval: Duration,
    pub probe_interval: Duration,
    pub namespace: String,
    pub db_path: PathBuf,
    pub log_retention: LogRetention,
    /// Named status mount point; `None` mounts a default container
    pub mount_point: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            tasks_path: DEFAULT_TASKS_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            sync_interval: Duration::from_secs(30),
            status_refresh_interval: Duration::from_secs(5),
            probe_interval: Duration::from_secs(15),
            namespace: DEFAULT_NAMESPACE.to_string(),
            db_path: default_db_path(),
            log_retention: LogRetention::Retain,
            mount_point: None,
        }
    }
}

/// Platform data directory location of the offline database
fn default_db_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    path.push("tasksync");
    path.push("offline.db");
    path
}

/// On-disk representation; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    server_url: Option<String>,
    tasks_path: Option<String>,
    health_path: Option<String>,
    sync_interval_secs: Option<u64>,
    status_refresh_interval_secs: Option<u64>,
    probe_interval_secs: Option<u64>,
    namespace: Option<String>,
    db_path: Option<PathBuf>,
    log_retention: Option<LogRetention>,
    mount_point: Option<String>,
}

impl SyncConfig {
    /// Create a new SyncConfigBuilder
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Defaults overridden by `CLIENT_API_URL`, `TASKSYNC_DB_PATH` and
    /// `TASKSYNC_MOUNT_POINT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Ok(url) = std::env::var("CLIENT_API_URL") {
            builder = builder.server_url(url);
        }
        if let Ok(path) = std::env::var("TASKSYNC_DB_PATH") {
            builder = builder.db_path(path);
        }
        if let Ok(mount) = std::env::var("TASKSYNC_MOUNT_POINT") {
            builder = builder.mount_point(mount);
        }
        builder.build()
    }

    /// Configuration for the desktop app
    ///
    /// Loads the TOML file named by `TASKSYNC_CONFIG` when it is set,
    /// otherwise falls back to `from_env`.
    pub fn from_env_or_file() -> Result<Self, ConfigError> {
        match std::env::var_os("TASKSYNC_CONFIG") {
            Some(path) if !path.is_empty() => {
                tracing::info!(path = ?path, "loading configuration file");
                Self::load(path)
            }
            _ => Self::from_env(),
        }
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut builder = Self::builder();
        if let Some(url) = file.server_url {
            builder = builder.server_url(url);
        }
        if let Some(path) = file.tasks_path {
            builder = builder.tasks_path(path);
        }
        if let Some(path) = file.health_path {
            builder = builder.health_path(path);
        }
        if let Some(secs) = file.sync_interval_secs {
            builder = builder.sync_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = file.status_refresh_interval_secs {
            builder = builder.status_refresh_interval(Duration::from_secs(secs));
        }
        if let Some(secs) = file.probe_interval_secs {
            builder = builder.probe_interval(Duration::from_secs(secs));
        }
        if let Some(namespace) = file.namespace {
            builder = builder.namespace(namespace);
        }
        if let Some(path) = file.db_path {
            builder = builder.db_path(path);
        }
        if let Some(retention) = file.log_retention {
            builder = builder.log_retention(retention);
        }
        if let Some(mount) = file.mount_point {
            builder = builder.mount_point(mount);
        }
        builder.build()
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.server_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.server_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                self.server_url,
                url.scheme()
            )));
        }
        for (name, path) in [("tasks_path", &self.tasks_path), ("health_path", &self.health_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: name,
                    message: format!("'{}' must start with '/'", path),
                });
            }
        }
        for (name, interval) in [
            ("sync_interval", self.sync_interval),
            ("status_refresh_interval", self.status_refresh_interval),
            ("probe_interval", self.probe_interval),
        ] {
            if interval.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: name,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::MissingValue("namespace"));
        }
        Ok(())
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }

    pub fn tasks_url(&self) -> String {
        self.api_url(&self.tasks_path)
    }

    pub fn health_url(&self) -> String {
        self.api_url(&self.health_path)
    }
}

/// Builder for SyncConfig
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    server_url: Option<String>,
    tasks_path: Option<String>,
    health_path: Option<String>,
    sync_interval: Option<Duration>,
    status_refresh_interval: Option<Duration>,
    probe_interval: Option<Duration>,
    namespace: Option<String>,
    db_path: Option<PathBuf>,
    log_retention: Option<LogRetention>,
    mount_point: Option<String>,
}

impl SyncConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn tasks_path(mut self, path: impl Into<String>) -> Self {
        self.tasks_path = Some(path.into());
        self
    }

    pub fn health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = Some(path.into());
        self
    }

    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    pub fn status_refresh_interval(mut self, interval: Duration) -> Self {
        self.status_refresh_interval = Some(interval);
        self
    }

    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = Some(interval);
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn log_retention(mut self, retention: LogRetention) -> Self {
        self.log_retention = Some(retention);
        self
    }

    pub fn mount_point(mut self, mount: impl Into<String>) -> Self {
        self.mount_point = Some(mount.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        let defaults = SyncConfig::default();
        let config = SyncConfig {
            server_url: self.server_url.unwrap_or(defaults.server_url),
            tasks_path: self.tasks_path.unwrap_or(defaults.tasks_path),
            health_path: self.health_path.unwrap_or(defaults.health_path),
            sync_interval: self.sync_interval.unwrap_or(defaults.sync_interval),
            status_refresh_interval: self
                .status_refresh_interval
                .unwrap_or(defaults.status_refresh_interval),
            probe_interval: self.probe_interval.unwrap_or(defaults.probe_interval),
            namespace: self.namespace.unwrap_or(defaults.namespace),
            db_path: self.db_path.unwrap_or(defaults.db_path),
            log_retention: self.log_retention.unwrap_or(defaults.log_retention),
            mount_point: self.mount_point.or(defaults.mount_point),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
///
/// These are programming or deployment mistakes and are only produced while
/// building the engine, never by runtime operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("status mount point '{0}' does not exist")]
    MissingMountPoint(String),
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("failed to read configuration: {0}")]
    Io(String),
    #[error("failed to open local storage: {0}")]
    Storage(String),
}
