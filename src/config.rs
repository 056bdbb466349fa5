//! Layered application configuration
//!
//! Defaults < config file (`flowdeck.yaml`) < `FLOWDECK_*` environment
//! overrides. Sections reuse the owning crate's config structs where one
//! exists so the file schema and the library defaults cannot drift.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backend_client::BackendConfig;
use config::{Config, Environment, File};
use flow_exec::{RetryPolicy, RunOptions};
use flow_history::HistoryConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

static DEFAULT_DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flowdeck")
});

fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("flowdeck").join("flowdeck.yaml"))
}

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub run: RunConfig,
    pub shots: ShotsConfig,
    pub history: HistorySettings,
}

/// Where documents, screenshots and logs live.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Data root; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,

    /// Revisions retained per flow
    pub max_revisions: Option<usize>,

    /// When set, logs are also written here as daily JSON files
    pub log_dir: Option<PathBuf>,
}

/// Execution defaults; per-invocation flags override them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub stop_on_failure: bool,
    pub capture_screenshots: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            timeout_secs: 300,
            max_attempts: retry.max_attempts,
            base_backoff_ms: retry.base_backoff_ms,
            max_backoff_ms: retry.max_backoff_ms,
            stop_on_failure: true,
            capture_screenshots: true,
        }
    }
}

impl RunConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_backoff_ms: self.base_backoff_ms,
            max_backoff_ms: self.max_backoff_ms,
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            retry: self.retry_policy(),
            stop_on_failure: self.stop_on_failure,
            capture_screenshots: self.capture_screenshots,
        }
    }
}

/// Screenshot retention.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotsConfig {
    pub ttl_sec: u64,
    pub max_total_bytes: u64,
}

impl Default for ShotsConfig {
    fn default() -> Self {
        let cfg = shot_store::ShotStoreConfig::default();
        Self {
            ttl_sec: cfg.ttl_sec,
            max_total_bytes: cfg.max_total_bytes,
        }
    }
}

/// Undo-history compression knobs used by `history-stats`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub capacity: usize,
    pub keyframe_interval: usize,
    pub compress: bool,
}

impl Default for HistorySettings {
    fn default() -> Self {
        let cfg = HistoryConfig::default();
        Self {
            capacity: cfg.capacity,
            keyframe_interval: cfg.keyframe_interval,
            compress: cfg.compress,
        }
    }
}

impl HistorySettings {
    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            capacity: self.capacity,
            keyframe_interval: self.keyframe_interval,
            compress: self.compress,
        }
    }
}

impl AppConfig {
    /// Load configuration, lowest precedence first: built-in defaults, the
    /// config file (explicit path, or the platform default when present),
    /// then `FLOWDECK_*` environment variables (`FLOWDECK_BACKEND__BASE_URL`).
    pub fn load(explicit_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).context("encoding defaults")?);

        match explicit_file {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()));
            }
            None => {
                if let Some(path) = default_config_file().filter(|p| p.exists()) {
                    builder = builder.add_source(File::from(path));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FLOWDECK")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("loading configuration")?
            .try_deserialize()
            .context("decoding configuration")
    }

    /// Data root after applying a command-line override.
    pub fn data_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.storage.data_dir.clone())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.clone())
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.storage.log_dir.clone()
    }
}
