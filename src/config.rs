//! Run configuration: thresholds, paths and cosmetic overrides.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_GAP_SECONDS: f64 = 30.0;
pub const DEFAULT_MIN_DURATION: f64 = 10.0;
pub const DEFAULT_MIN_SNAPSHOTS: usize = 25;
pub const DEFAULT_PREFIX: &str = "TWThreat";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("gap threshold must be a finite, non-negative number of seconds (got {0})")]
    InvalidGap(f64),
    #[error("minimum fight duration must be a finite, non-negative number of seconds (got {0})")]
    InvalidMinDuration(f64),
    #[error("log file prefix must not be empty")]
    EmptyPrefix,
}

/// Limits used to cut the merged timeline into fights and drop noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentThresholds {
    /// A gap strictly larger than this starts a new fight.
    pub gap_seconds: f64,
    pub min_duration: f64,
    pub min_snapshots: usize,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            gap_seconds: DEFAULT_GAP_SECONDS,
            min_duration: DEFAULT_MIN_DURATION,
            min_snapshots: DEFAULT_MIN_SNAPSHOTS,
        }
    }
}

impl SegmentThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gap_seconds.is_finite() || self.gap_seconds < 0.0 {
            return Err(ConfigError::InvalidGap(self.gap_seconds));
        }
        if !self.min_duration.is_finite() || self.min_duration < 0.0 {
            return Err(ConfigError::InvalidMinDuration(self.min_duration));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub log_dir: PathBuf,
    pub prefix: String,
    pub combat_log: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub thresholds: SegmentThresholds,
    /// Header label only; never changes per-fight target inference.
    pub raid_override: Option<String>,
    pub bosses_only: bool,
    /// When non-empty, player stats are limited to members of these guilds.
    pub guilds: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("ThreatLogs"),
            prefix: DEFAULT_PREFIX.to_string(),
            combat_log: PathBuf::from("WoWCombatLog.txt"),
            output: PathBuf::from("ThreatLogs/raid-threat-report.html"),
            format: OutputFormat::Html,
            thresholds: SegmentThresholds::default(),
            raid_override: None,
            bosses_only: false,
            guilds: Vec::new(),
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        self.thresholds.validate()
    }

    /// Override label with surrounding whitespace removed; blank counts as absent.
    pub fn raid_label_override(&self) -> Option<&str> {
        self.raid_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = ReportConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.thresholds.gap_seconds, 30.0);
        assert_eq!(config.thresholds.min_duration, 10.0);
        assert_eq!(config.thresholds.min_snapshots, 25);
    }

    #[test]
    fn negative_gap_is_rejected() {
        let thresholds = SegmentThresholds {
            gap_seconds: -1.0,
            ..Default::default()
        };
        assert_eq!(thresholds.validate(), Err(ConfigError::InvalidGap(-1.0)));
    }

    #[test]
    fn nan_min_duration_is_rejected() {
        let thresholds = SegmentThresholds {
            min_duration: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ConfigError::InvalidMinDuration(_))
        ));
    }

    #[test]
    fn blank_raid_override_is_ignored() {
        let config = ReportConfig {
            raid_override: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.raid_label_override(), None);

        let config = ReportConfig {
            raid_override: Some(" Naxxramas ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.raid_label_override(), Some("Naxxramas"));
    }
}
