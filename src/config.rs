//! Application-level configuration loading for the scoreboard backend.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURTSIDE_BACK_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Idle retention window for stored snapshots.
    pub snapshot_ttl: Duration,
    /// Interval between background expiry sweeps.
    pub sweep_interval: Duration,
    /// Buffered frames per match topic.
    pub channel_capacity: usize,
    /// Keepalive cadence on WebSocket connections.
    pub ping_interval: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
            channel_capacity: 32,
            ping_interval: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file. Every field is optional;
/// absent fields keep their built-in default.
struct RawConfig {
    snapshot_ttl_hours: Option<u64>,
    sweep_interval_seconds: Option<u64>,
    channel_capacity: Option<usize>,
    ping_interval_seconds: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            snapshot_ttl: raw
                .snapshot_ttl_hours
                .map(|hours| Duration::from_secs(hours * 60 * 60))
                .unwrap_or(defaults.snapshot_ttl),
            sweep_interval: raw
                .sweep_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            channel_capacity: raw.channel_capacity.unwrap_or(defaults.channel_capacity),
            ping_interval: raw
                .ping_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.ping_interval),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
