//! Serde default helpers for config fields.

pub(super) fn default_name() -> String {
    "Streak".to_string()
}

pub(super) fn default_data_dir() -> String {
    "~/.streak".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_utc_offset() -> String {
    "+05:30".to_string()
}

pub(super) fn default_plan_path() -> String {
    "~/.streak/data/plan.json".to_string()
}

pub(super) fn default_evening_time() -> String {
    "17:30".to_string()
}

pub(super) fn default_night_time() -> String {
    "22:30".to_string()
}

pub(super) fn default_evening_retry_secs() -> u64 {
    300
}

pub(super) fn default_evening_max_prompts() -> u32 {
    2
}

pub(super) fn default_hard_topic_timeout_secs() -> u64 {
    120
}

pub(super) fn default_state_path() -> String {
    "~/.streak/data/state.json".to_string()
}

pub(super) fn default_weekly_time() -> String {
    "21:00".to_string()
}

pub(super) fn default_remote_name() -> String {
    "plan.json".to_string()
}

pub(super) fn default_token_path() -> String {
    "~/.streak/data/token.json".to_string()
}

pub(super) fn default_sync_max_attempts() -> u32 {
    3
}

pub(super) fn default_sync_retry_delay_secs() -> u64 {
    2
}

pub(super) fn default_true() -> bool {
    true
}
