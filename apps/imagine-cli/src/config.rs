//! CLI configuration.
//!
//! Optional TOML file:
//! - Linux: `~/.config/imagine/config.toml`
//! - Windows: `%APPDATA%/imagine/config.toml`
//!
//! A missing file yields defaults. Command-line values override it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use imagine_pipeline::{
    CANDIDATE_COUNT, DEFAULT_CANDIDATE_INDEX, RetryPolicy, fetch::DOWNLOAD_ATTEMPTS,
};

/// Retry settings for one pipeline phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts allowed; absent means retry until a result arrives.
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry, in milliseconds. Zero retries at once.
    #[serde(default)]
    pub initial_delay_ms: u64,

    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay_ms: 0,
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        let base = match self.max_attempts {
            Some(n) => RetryPolicy::bounded(n),
            None => RetryPolicy::unbounded(),
        };
        if self.initial_delay_ms == 0 {
            return base;
        }
        base.with_backoff(
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.backoff_factor,
        )
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gateway WebSocket URL.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Name reported to the gateway (hostname by default).
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Candidate of the generated grid to upscale (1-based).
    #[serde(default = "default_candidate")]
    pub candidate: u8,

    /// Attempts made for the final download.
    #[serde(default = "default_download_attempts")]
    pub download_attempts: u32,

    /// Enables debug logging when `RUST_LOG` is unset.
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub generate: RetrySettings,

    #[serde(default)]
    pub upscale: RetrySettings,
}

fn default_gateway_url() -> String {
    "ws://127.0.0.1:8062/ws".into()
}

fn default_client_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "imagine".into())
}

fn default_candidate() -> u8 {
    DEFAULT_CANDIDATE_INDEX
}

fn default_download_attempts() -> u32 {
    DOWNLOAD_ATTEMPTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            client_name: default_client_name(),
            candidate: default_candidate(),
            download_attempts: default_download_attempts(),
            debug: false,
            generate: RetrySettings::default(),
            upscale: RetrySettings::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::read(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(1..=CANDIDATE_COUNT).contains(&self.candidate) {
            anyhow::bail!(
                "candidate must be between 1 and {CANDIDATE_COUNT}, got {}",
                self.candidate
            );
        }
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("imagine").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("imagine")
            .join("config.toml")
    }
}
