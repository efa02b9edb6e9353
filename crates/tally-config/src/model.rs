// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tally sales bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Top-level Tally configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with `TALLY_*`
/// environment variable overrides. Every section has defaults; credentials
/// are checked separately by [`validate_for_serve`](crate::validation::validate_for_serve).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    /// Bot identity and conversation behavior.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Administrator panel settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Ledger database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Periodic job settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Uptime monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Bot identity and conversation behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used in logs and the startup note.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Share of a seller's gross revenue paid as commission.
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,

    /// Sessions idle for longer than this are evicted from memory.
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,

    /// Pause after a transport receive error before polling again.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
            commission_rate: default_commission_rate(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

fn default_bot_name() -> String {
    "tally".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_commission_rate() -> f64 {
    0.20
}

fn default_session_idle_timeout_secs() -> u64 {
    3600
}

fn default_backoff_secs() -> u64 {
    15
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `tally serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Group chat receiving the weekly digest. Required by `tally serve`.
    #[serde(default)]
    pub group_chat_id: Option<i64>,

    /// Chat receiving operational notes. `None` disables mirroring.
    #[serde(default)]
    pub ops_chat_id: Option<i64>,
}

/// Administrator panel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Password unlocking `/admin`. Required by `tally serve`.
    #[serde(default)]
    pub password: Option<String>,
}

/// Ledger database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "tally.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Periodic job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Minutes between sales reminders to logged-in sellers.
    #[serde(default = "default_reminder_interval_mins")]
    pub reminder_interval_mins: u64,

    /// Day of the week the digest is broadcast (`mon` .. `sun`).
    #[serde(default = "default_digest_weekday")]
    pub digest_weekday: String,

    /// Local time of day the digest is broadcast (`HH:MM`).
    #[serde(default = "default_digest_time")]
    pub digest_time: String,

    /// Minutes between uptime monitor checks.
    #[serde(default = "default_health_interval_mins")]
    pub health_interval_mins: u64,
}

impl ScheduleConfig {
    /// Parses [`digest_weekday`](Self::digest_weekday).
    pub fn parsed_weekday(&self) -> Result<Weekday, String> {
        self.digest_weekday
            .trim()
            .parse::<Weekday>()
            .map_err(|_| format!("`{}` is not a day of the week", self.digest_weekday))
    }

    /// Parses [`digest_time`](Self::digest_time).
    pub fn parsed_time(&self) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(self.digest_time.trim(), "%H:%M")
            .map_err(|e| format!("`{}` is not a HH:MM time: {e}", self.digest_time))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reminder_interval_mins: default_reminder_interval_mins(),
            digest_weekday: default_digest_weekday(),
            digest_time: default_digest_time(),
            health_interval_mins: default_health_interval_mins(),
        }
    }
}

fn default_reminder_interval_mins() -> u64 {
    120
}

fn default_digest_weekday() -> String {
    "sun".to_string()
}

fn default_digest_time() -> String {
    "20:00".to_string()
}

fn default_health_interval_mins() -> u64 {
    20
}

/// Uptime monitor configuration (UptimeRobot `getMonitors` API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Run the periodic health check.
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint of the monitor API.
    #[serde(default = "default_monitor_api_url")]
    pub api_url: String,

    /// API key. Required when enabled.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Monitor to query. Required when enabled.
    #[serde(default)]
    pub monitor_id: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_monitor_api_url(),
            api_key: None,
            monitor_id: None,
        }
    }
}

fn default_monitor_api_url() -> String {
    "https://api.uptimerobot.com/v2/getMonitors".to_string()
}
