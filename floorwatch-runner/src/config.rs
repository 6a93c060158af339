//! Runtime configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Times are written as `"HH:MM"` (seconds are accepted on input).

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use floorwatch_core::replay::{default_session_open, ReplayWindow};
use floorwatch_core::signal::SignalConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Intraday monitoring window for the live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    #[serde(with = "hhmm")]
    pub monitor_start: NaiveTime,
    #[serde(with = "hhmm")]
    pub monitor_end: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let window = ReplayWindow::default();
        Self {
            monitor_start: window.start(),
            monitor_end: window.end(),
        }
    }
}

impl SessionConfig {
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.monitor_start <= t && t <= self.monitor_end
    }
}

/// Replay window and the minute-bar mapping knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Falls back to `session.monitor_start` when unset.
    #[serde(with = "hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub window_start: Option<NaiveTime>,
    /// Falls back to `session.monitor_end` when unset.
    #[serde(with = "hhmm_opt", skip_serializing_if = "Option::is_none")]
    pub window_end: Option<NaiveTime>,
    #[serde(with = "hhmm")]
    pub session_open: NaiveTime,
    /// Floor as a fraction of the previous close, used when a bar has no limit price.
    pub limit_down_ratio: f64,
    pub allow_limit_fallback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            window_start: None,
            window_end: None,
            session_open: default_session_open(),
            limit_down_ratio: 0.9,
            allow_limit_fallback: true,
        }
    }
}

/// Pre-open one-word summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreopenConfig {
    /// Latest snapshot time considered for the summary.
    #[serde(with = "hhmm")]
    pub scan_time: NaiveTime,
    /// Rows per message before the summary is split into chunks.
    pub max_rows_per_chunk: usize,
}

impl Default for PreopenConfig {
    fn default() -> Self {
        Self {
            scan_time: NaiveTime::from_hms_opt(9, 26, 0).unwrap_or(NaiveTime::MIN),
            max_rows_per_chunk: 80,
        }
    }
}

/// Top-level configuration for the runner and CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub signal: SignalConfig,
    pub session: SessionConfig,
    pub replay: ReplayConfig,
    pub preopen: PreopenConfig,
}

impl MonitorConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.signal.validate().map_err(ConfigError::Invalid)?;
        if self.session.monitor_start > self.session.monitor_end {
            return Err(ConfigError::Invalid(format!(
                "session.monitor_start {} is after monitor_end {}",
                self.session.monitor_start.format("%H:%M"),
                self.session.monitor_end.format("%H:%M"),
            )));
        }
        self.replay_window()?;
        let ratio = self.replay.limit_down_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "replay.limit_down_ratio must be in (0, 1), got {ratio}"
            )));
        }
        if self.preopen.max_rows_per_chunk == 0 {
            return Err(ConfigError::Invalid(
                "preopen.max_rows_per_chunk must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Effective replay window (unset bounds inherit the session window).
    pub fn replay_window(&self) -> Result<ReplayWindow, ConfigError> {
        let start = self.replay.window_start.unwrap_or(self.session.monitor_start);
        let end = self.replay.window_end.unwrap_or(self.session.monitor_end);
        ReplayWindow::with_open(start, end, self.replay.session_open)
            .map_err(|e| ConfigError::Invalid(format!("replay window: {e}")))
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{s}' (expected HH:MM): {e}"))
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| super::parse_hhmm(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
