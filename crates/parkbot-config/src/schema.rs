//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// How a requested window is split into sessions
    #[serde(default)]
    pub planner: RawPlannerConfig,

    /// Monthly time allowance
    #[serde(default)]
    pub budget: RawBudgetConfig,

    /// Account balance handling
    #[serde(default)]
    pub account: RawAccountConfig,

    /// Per-session retry policy
    #[serde(default)]
    pub retry: RawRetryConfig,

    /// Pause between successful bookings
    #[serde(default)]
    pub cooldown: RawCooldownConfig,

    /// External helper programs that talk to the booking site
    #[serde(default)]
    pub booking: Option<RawBookingConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPlannerConfig {
    /// Length of one paid session (default: 10)
    pub session_minutes: Option<u32>,

    /// Longest free break between sessions (default: 5)
    pub max_break_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawBudgetConfig {
    /// Parking hours allowed per calendar month (default: 150)
    pub monthly_allowance_hours: Option<f64>,

    /// Band around the prorated expectation counted as "on schedule",
    /// as a percentage of the allowance (default: 1.0)
    pub tolerance_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawAccountConfig {
    /// Price of one session in euro cents, used for the balance check (default: 0)
    pub session_cost_cents: Option<u64>,

    /// Warn when the balance drops below this many cents (default: 3000)
    pub balance_warning_cents: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRetryConfig {
    /// Attempts per session including the first (default: 3)
    pub max_attempts: Option<u32>,

    /// "fixed", "linear" or "exponential" (default: "exponential")
    pub backoff: Option<String>,

    /// Delay after the first failed attempt (default: 2000)
    pub base_delay_ms: Option<u64>,

    /// Upper bound for any retry delay (default: 30000)
    pub max_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCooldownConfig {
    /// Pause after a successful booking (default: 2000)
    pub base_ms: Option<u64>,

    /// Added per session already booked in the run (default: 500)
    pub step_ms: Option<u64>,

    /// Cap on the pause (default: 5000)
    pub max_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawBookingConfig {
    /// argv run once per booking attempt
    pub book_command: Vec<String>,

    /// argv that prints the account status as JSON
    pub status_command: Vec<String>,

    /// Kill a helper that runs longer than this (default: 15)
    pub timeout_seconds: Option<u64>,

    /// Extra environment for both helpers
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [planner]
            session_minutes = 15
            max_break_minutes = 3

            [budget]
            monthly_allowance_hours = 120

            [retry]
            max_attempts = 4
            backoff = "linear"

            [booking]
            book_command = ["/usr/local/bin/park-book"]
            status_command = ["/usr/local/bin/park-status", "--json"]

            [booking.env]
            PARKBOT_PLATE = "AB123C"
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.planner.session_minutes, Some(15));
        assert_eq!(config.budget.monthly_allowance_hours, Some(120.0));
        assert_eq!(config.retry.backoff.as_deref(), Some("linear"));
        let booking = config.booking.unwrap();
        assert_eq!(booking.status_command.len(), 2);
        assert_eq!(booking.env.get("PARKBOT_PLATE").map(String::as_str), Some("AB123C"));
    }

    #[test]
    fn parse_version_only() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.planner.session_minutes.is_none());
        assert!(config.booking.is_none());
    }
}
