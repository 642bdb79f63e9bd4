//! Environment-based configuration.

use std::env;
use std::str::FromStr;

use crate::{
    DEFAULT_DB_PATH, DEFAULT_HTTP_PORT, DEFAULT_NETWORK_INTERVAL_MS, DEFAULT_SYSTEM_INTERVAL_MS,
};

/// Process configuration loaded from environment variables.
///
/// CLI flags take precedence over these values; the environment only supplies
/// defaults so the service can be configured without a command line (e.g. in
/// a systemd unit or container).
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// SQLite database path (`DB_PATH`)
    pub db_path: String,
    /// System sampling interval in milliseconds (`SYSTEM_METRICS_INTERVAL`)
    pub system_interval_ms: u64,
    /// Network sampling interval in milliseconds (`NETWORK_METRICS_INTERVAL`)
    pub network_interval_ms: u64,
    /// HTTP listen port (`PORT`)
    pub port: u16,
    /// Days of metric history to keep, 0 keeps everything
    /// (`METRICS_RETENTION_DAYS`)
    pub retention_days: u32,
}

impl EnvConfig {
    /// Load configuration from environment variables, falling back to the
    /// crate defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            system_interval_ms: parse_env("SYSTEM_METRICS_INTERVAL", DEFAULT_SYSTEM_INTERVAL_MS),
            network_interval_ms: parse_env(
                "NETWORK_METRICS_INTERVAL",
                DEFAULT_NETWORK_INTERVAL_MS,
            ),
            port: parse_env("PORT", DEFAULT_HTTP_PORT),
            retention_days: parse_env("METRICS_RETENTION_DAYS", 0),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
