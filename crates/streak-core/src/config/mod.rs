mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::StreakError;
use chrono::{FixedOffset, NaiveDate, NaiveTime};
use defaults::*;

/// Top-level Streak configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramConfig>,
}

/// Telegram bot config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    /// Destination chat for scheduled prompts and reports.
    #[serde(default)]
    pub chat_id: i64,
    /// Allowed sender user ids. Empty = only the destination chat's user.
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

/// Day-tracking configuration: the start date, the local timezone, the plan
/// document location, and the two daily check-in times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// First tracked day, `%Y-%m-%d`.
    #[serde(default)]
    pub start_date: String,
    /// Fixed UTC offset of the user's local time, e.g. "+05:30".
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Path to the plan document.
    #[serde(default = "default_plan_path")]
    pub plan_path: String,
    /// Optional seed document copied into place when `plan_path` is absent.
    #[serde(default)]
    pub seed_path: Option<String>,
    /// Evening start-check time, `%H:%M` local.
    #[serde(default = "default_evening_time")]
    pub evening_time: String,
    /// Night completion-check time, `%H:%M` local.
    #[serde(default = "default_night_time")]
    pub night_time: String,
    /// Delay before re-prompting an unanswered evening check.
    #[serde(default = "default_evening_retry_secs")]
    pub evening_retry_secs: u64,
    /// Evening prompts per day before giving up.
    #[serde(default = "default_evening_max_prompts")]
    pub evening_max_prompts: u32,
    /// How long to wait for a hard-topic reply before writing the sentinel.
    #[serde(default = "default_hard_topic_timeout_secs")]
    pub hard_topic_timeout_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            start_date: String::new(),
            utc_offset: default_utc_offset(),
            plan_path: default_plan_path(),
            seed_path: None,
            evening_time: default_evening_time(),
            night_time: default_night_time(),
            evening_retry_secs: default_evening_retry_secs(),
            evening_max_prompts: default_evening_max_prompts(),
            hard_topic_timeout_secs: default_hard_topic_timeout_secs(),
        }
    }
}

impl TrackingConfig {
    /// Parsed tracking start date.
    pub fn start(&self) -> Result<NaiveDate, StreakError> {
        NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d").map_err(|e| {
            StreakError::Config(format!(
                "invalid tracking.start_date '{}': {e}",
                self.start_date
            ))
        })
    }

    /// Parsed UTC offset.
    pub fn offset(&self) -> Result<FixedOffset, StreakError> {
        parse_utc_offset(&self.utc_offset)
    }

    /// Parsed evening check-in time.
    pub fn evening(&self) -> Result<NaiveTime, StreakError> {
        parse_time_of_day("tracking.evening_time", &self.evening_time)
    }

    /// Parsed night check-in time.
    pub fn night(&self) -> Result<NaiveTime, StreakError> {
        parse_time_of_day("tracking.night_time", &self.night_time)
    }
}

/// Persistent interaction state config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

/// Weekly report config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sunday delivery time, `%H:%M` local.
    #[serde(default = "default_weekly_time")]
    pub weekly_time: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weekly_time: default_weekly_time(),
        }
    }
}

impl ReportConfig {
    pub fn weekly(&self) -> Result<NaiveTime, StreakError> {
        parse_time_of_day("report.weekly_time", &self.weekly_time)
    }
}

/// Sync gateway config (Google Drive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Remote object name the plan document is uploaded as.
    #[serde(default = "default_remote_name")]
    pub remote_name: String,
    /// Path to the OAuth token JSON.
    #[serde(default = "default_token_path")]
    pub token_path: String,
    /// Optional remote folder id new uploads are created under.
    #[serde(default)]
    pub folder_id: String,
    /// Known remote file id. Discovered and logged on first upload if empty.
    #[serde(default)]
    pub file_id: String,
    #[serde(default = "default_sync_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_sync_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            remote_name: default_remote_name(),
            token_path: default_token_path(),
            folder_id: String::new(),
            file_id: String::new(),
            max_attempts: default_sync_max_attempts(),
            retry_delay_secs: default_sync_retry_delay_secs(),
        }
    }
}

/// Parse a fixed UTC offset string like "+05:30" or "-08:00".
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, StreakError> {
    let err = || StreakError::Config(format!("invalid utc_offset '{s}', expected e.g. +05:30"));

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(err()),
    };
    let (h, m) = rest.split_once(':').ok_or_else(err)?;
    let hours: i32 = h.parse().map_err(|_| err())?;
    let minutes: i32 = m.parse().map_err(|_| err())?;
    if hours > 23 || minutes > 59 {
        return Err(err());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(err)
}

/// Parse a wall-clock time string like "17:30".
pub fn parse_time_of_day(field: &str, s: &str) -> Result<NaiveTime, StreakError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| StreakError::Config(format!("invalid {field} '{s}': {e}")))
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, StreakError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config {
            streak: StreakConfig::default(),
            channel: ChannelConfig::default(),
            tracking: TrackingConfig::default(),
            state: StateConfig::default(),
            report: ReportConfig::default(),
            sync: SyncConfig::default(),
        });
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| StreakError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| StreakError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
