//! Console configuration loaded from the environment.

use std::str::FromStr;

use studio_core::beats::DEFAULT_BEAT_GAP_SECS;
use studio_tracker::config::DEFAULT_POLL_INTERVAL_MS;
use studio_tracker::TrackerConfig;

use crate::error::ConsoleError;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Backend base URL (default: `http://127.0.0.1:8000`).
    pub api_url: String,
    /// Delay between status polls in milliseconds (default: `2000`).
    pub poll_interval_ms: u64,
    /// Spacing of appended beats in seconds (default: `2.0`).
    pub beat_gap_secs: f64,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            beat_gap_secs: DEFAULT_BEAT_GAP_SECS,
            log_json: false,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `STUDIO_API_URL`          | `http://127.0.0.1:8000` |
    /// | `STUDIO_POLL_INTERVAL_MS` | `2000`                  |
    /// | `STUDIO_BEAT_GAP_SECS`    | `2.0`                   |
    /// | `STUDIO_LOG_JSON`         | unset                   |
    pub fn from_env() -> Result<Self, ConsoleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConsoleError> {
        let defaults = Self::default();

        let api_url = lookup("STUDIO_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_url);
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConsoleError::Config(format!(
                "STUDIO_API_URL must be an http(s) URL, got '{api_url}'"
            )));
        }

        let poll_interval_ms: u64 =
            parse_var(&lookup, "STUDIO_POLL_INTERVAL_MS")?.unwrap_or(defaults.poll_interval_ms);
        if poll_interval_ms == 0 {
            return Err(ConsoleError::Config(
                "STUDIO_POLL_INTERVAL_MS must be greater than 0".to_string(),
            ));
        }

        let beat_gap_secs: f64 =
            parse_var(&lookup, "STUDIO_BEAT_GAP_SECS")?.unwrap_or(defaults.beat_gap_secs);
        if !beat_gap_secs.is_finite() || beat_gap_secs < 0.0 {
            return Err(ConsoleError::Config(format!(
                "STUDIO_BEAT_GAP_SECS must be a non-negative number, got {beat_gap_secs}"
            )));
        }

        let log_json = lookup("STUDIO_LOG_JSON")
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        Ok(Self {
            api_url,
            poll_interval_ms,
            beat_gap_secs,
            log_json,
        })
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig::from_millis(self.poll_interval_ms)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConsoleError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConsoleError::Config(format!("{key} is not valid: '{raw}'"))),
    }
}
