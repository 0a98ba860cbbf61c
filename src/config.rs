//! # Client Configuration
//!
//! Endpoints and timing for the scan client. Values come from, in order of
//! precedence: command-line flags, `UVSCAN_*` environment variables, an
//! optional JSON file, and the built-in defaults.

use crate::constants::{
    COUNTDOWN_TICK, DEFAULT_CLASSIFY_URL, DEFAULT_DEVICE_URL, DEFAULT_UV_CURRENT_URL,
    DEFAULT_UV_HISTORY_URL, HTTP_TIMEOUT, RECONNECT_DELAY, SCAN_WATCHDOG,
};
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the device connection, scan timing and backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub device_url: String,
    pub classify_url: String,
    pub uv_current_url: String,
    pub uv_history_url: String,
    pub reconnect_delay_ms: u64,
    pub watchdog_ms: u64,
    pub countdown_tick_ms: u64,
    pub http_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            device_url: DEFAULT_DEVICE_URL.to_string(),
            classify_url: DEFAULT_CLASSIFY_URL.to_string(),
            uv_current_url: DEFAULT_UV_CURRENT_URL.to_string(),
            uv_history_url: DEFAULT_UV_HISTORY_URL.to_string(),
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
            watchdog_ms: SCAN_WATCHDOG.as_millis() as u64,
            countdown_tick_ms: COUNTDOWN_TICK.as_millis() as u64,
            http_timeout_ms: HTTP_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    /// Loads a config file (if given) and applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ScanError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| ScanError::ConfigError(format!("{}: {e}", path.display())))
    }

    /// Applies `UVSCAN_*` overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("UVSCAN_DEVICE_URL") {
            self.device_url = v;
        }
        if let Some(v) = lookup("UVSCAN_CLASSIFY_URL") {
            self.classify_url = v;
        }
        if let Some(v) = lookup("UVSCAN_UV_CURRENT_URL") {
            self.uv_current_url = v;
        }
        if let Some(v) = lookup("UVSCAN_UV_HISTORY_URL") {
            self.uv_history_url = v;
        }
        if let Some(v) = lookup("UVSCAN_RECONNECT_MS") {
            self.reconnect_delay_ms = parse_millis("UVSCAN_RECONNECT_MS", &v)?;
        }
        if let Some(v) = lookup("UVSCAN_WATCHDOG_MS") {
            self.watchdog_ms = parse_millis("UVSCAN_WATCHDOG_MS", &v)?;
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64, ScanError> {
    let ms: u64 = value
        .trim()
        .parse()
        .map_err(|_| ScanError::ConfigError(format!("{key} must be milliseconds, got {value:?}")))?;
    if ms == 0 {
        return Err(ScanError::ConfigError(format!("{key} must be non-zero")));
    }
    Ok(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_observed_timing() {
        let config = ClientConfig::default();
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.watchdog(), Duration::from_secs(8));
        assert_eq!(config.countdown_tick(), Duration::from_secs(1));
        assert_eq!(config.device_url, "ws://localhost:8765");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("UVSCAN_DEVICE_URL", "ws://10.0.0.7:8765"),
            ("UVSCAN_WATCHDOG_MS", "5000"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.device_url, "ws://10.0.0.7:8765");
        assert_eq!(config.watchdog(), Duration::from_secs(5));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_rejects_bad_millis() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_env(|k| (k == "UVSCAN_RECONNECT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));

        let err = config
            .apply_env(|k| (k == "UVSCAN_RECONNECT_MS").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classify_url": "http://backend/spf/"}}"#).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.classify_url, "http://backend/spf/");
        assert_eq!(config.device_url, DEFAULT_DEVICE_URL);
        assert_eq!(config.watchdog_ms, 8000);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = ClientConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ScanError::ConfigError(_)));
    }
}
