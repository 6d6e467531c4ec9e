//! Tracker configuration stored in `tracker.toml`.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::rules::{CalendarZone, RuleValidator};

pub const DEFAULT_CONFIG_PATH: &str = "tracker.toml";

/// Tracker configuration (TOML).
///
/// Missing fields fall back to defaults, and so does a missing file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the tracking server listens on.
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pause between replayed updates, in milliseconds.
    pub update_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RulesConfig {
    /// Calendar used for delivery-day arithmetic, in minutes east of UTC.
    /// Unset means the local time zone.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 1000,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            server: ServerConfig::default(),
            simulation: SimulationConfig::default(),
            rules: RulesConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            return Err(anyhow!("log_filter must not be empty"));
        }
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must not be empty"));
        }
        if let Some(minutes) = self.rules.utc_offset_minutes {
            if CalendarZone::from_offset_minutes(minutes).is_none() {
                return Err(anyhow!(
                    "rules.utc_offset_minutes must be strictly between -1440 and 1440, got {}",
                    minutes
                ));
            }
        }
        Ok(())
    }

    pub fn calendar_zone(&self) -> CalendarZone {
        self.rules
            .utc_offset_minutes
            .and_then(CalendarZone::from_offset_minutes)
            .unwrap_or_default()
    }

    pub fn rule_validator(&self) -> RuleValidator {
        RuleValidator::new(self.calendar_zone())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `TrackerConfig::default()`.
pub fn load_config(path: &Path) -> Result<TrackerConfig> {
    if !path.exists() {
        let cfg = TrackerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TrackerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
