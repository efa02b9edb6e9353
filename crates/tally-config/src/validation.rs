// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! [`validate_config`] checks semantic constraints that serde cannot express.
//! [`validate_for_serve`] additionally requires the credentials a running
//! bot needs. Both collect every error instead of stopping at the first.

use crate::diagnostic::ConfigError;
use crate::model::TallyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &TallyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bot.log_level.trim().to_ascii_lowercase().as_str()) {
        invalid(format!(
            "bot.log_level `{}` must be one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let rate = config.bot.commission_rate;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        invalid(format!("bot.commission_rate must be between 0 and 1, got {rate}"));
    }

    if config.bot.session_idle_timeout_secs == 0 {
        invalid("bot.session_idle_timeout_secs must be at least 1".to_string());
    }

    if config.bot.backoff_secs == 0 {
        invalid("bot.backoff_secs must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    if config.schedule.reminder_interval_mins == 0 {
        invalid("schedule.reminder_interval_mins must be at least 1".to_string());
    }

    if config.schedule.health_interval_mins == 0 {
        invalid("schedule.health_interval_mins must be at least 1".to_string());
    }

    if let Err(e) = config.schedule.parsed_weekday() {
        invalid(format!("schedule.digest_weekday {e}"));
    }

    if let Err(e) = config.schedule.parsed_time() {
        invalid(format!("schedule.digest_time {e}"));
    }

    if config.monitor.enabled && config.monitor.api_url.trim().is_empty() {
        invalid("monitor.api_url must not be empty when the monitor is enabled".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Require the credentials `tally serve` cannot run without.
pub fn validate_for_serve(config: &TallyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut missing = |key: &str| {
        errors.push(ConfigError::MissingKey {
            key: key.to_string(),
        })
    };

    if is_blank(config.telegram.bot_token.as_deref()) {
        missing("telegram.bot_token");
    }
    if config.telegram.group_chat_id.is_none() {
        missing("telegram.group_chat_id");
    }
    if is_blank(config.admin.password.as_deref()) {
        missing("admin.password");
    }
    if config.monitor.enabled {
        if is_blank(config.monitor.api_key.as_deref()) {
            missing("monitor.api_key");
        }
        if is_blank(config.monitor.monitor_id.as_deref()) {
            missing("monitor.monitor_id");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
