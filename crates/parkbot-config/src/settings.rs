//! Validated settings structures

use crate::schema::{
    RawAccountConfig, RawBookingConfig, RawBudgetConfig, RawConfig, RawCooldownConfig,
    RawPlannerConfig, RawRetryConfig,
};
use crate::validation::parse_backoff;
use parkbot_api::{CooldownPolicy, RetryPolicy};
use parkbot_util::Money;
use std::collections::HashMap;
use std::time::Duration;

/// Validated settings ready for use by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub planner: PlannerSettings,
    pub budget: BudgetSettings,
    pub account: AccountSettings,
    pub retry: RetryPolicy,
    pub cooldown: CooldownPolicy,
    /// None when no booking helpers are configured; only dry runs work then
    pub booking: Option<BookingSettings>,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            planner: PlannerSettings::from_raw(raw.planner),
            budget: BudgetSettings::from_raw(raw.budget),
            account: AccountSettings::from_raw(raw.account),
            retry: convert_retry(raw.retry),
            cooldown: convert_cooldown(raw.cooldown),
            booking: raw.booking.map(BookingSettings::from_raw),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            planner: PlannerSettings::default(),
            budget: BudgetSettings::default(),
            account: AccountSettings::default(),
            retry: RetryPolicy::default(),
            cooldown: CooldownPolicy::default(),
            booking: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerSettings {
    pub session_minutes: u32,
    pub max_break_minutes: u32,
}

impl PlannerSettings {
    fn from_raw(raw: RawPlannerConfig) -> Self {
        let defaults = Self::default();
        Self {
            session_minutes: raw.session_minutes.unwrap_or(defaults.session_minutes),
            max_break_minutes: raw.max_break_minutes.unwrap_or(defaults.max_break_minutes),
        }
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            session_minutes: 10,
            max_break_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetSettings {
    pub monthly_allowance: chrono::Duration,
    pub tolerance_percent: f64,
}

impl BudgetSettings {
    fn from_raw(raw: RawBudgetConfig) -> Self {
        let defaults = Self::default();
        Self {
            monthly_allowance: raw
                .monthly_allowance_hours
                .map(hours_to_duration)
                .unwrap_or(defaults.monthly_allowance),
            tolerance_percent: raw.tolerance_percent.unwrap_or(defaults.tolerance_percent),
        }
    }

    /// Band around the prorated expectation that still counts as on schedule
    pub fn tolerance(&self) -> chrono::Duration {
        let minutes = self.monthly_allowance.num_minutes() as f64 * self.tolerance_percent / 100.0;
        chrono::Duration::minutes(minutes.round() as i64)
    }
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            monthly_allowance: chrono::Duration::hours(150),
            tolerance_percent: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSettings {
    /// Price of one session; the balance is checked before every session even when zero
    pub session_cost: Money,
    pub balance_warning: Money,
}

impl AccountSettings {
    fn from_raw(raw: RawAccountConfig) -> Self {
        let defaults = Self::default();
        Self {
            session_cost: raw
                .session_cost_cents
                .map(cents_to_money)
                .unwrap_or(defaults.session_cost),
            balance_warning: raw
                .balance_warning_cents
                .map(cents_to_money)
                .unwrap_or(defaults.balance_warning),
        }
    }
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            session_cost: Money::ZERO,
            balance_warning: Money::from_cents(3000),
        }
    }
}

/// External helper programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingSettings {
    pub book_command: Vec<String>,
    pub status_command: Vec<String>,
    pub timeout: Duration,
    pub env: HashMap<String, String>,
}

impl BookingSettings {
    fn from_raw(raw: RawBookingConfig) -> Self {
        Self {
            book_command: raw.book_command,
            status_command: raw.status_command,
            timeout: Duration::from_secs(raw.timeout_seconds.unwrap_or(15)),
            env: raw.env,
        }
    }
}

fn convert_retry(raw: RawRetryConfig) -> RetryPolicy {
    let defaults = RetryPolicy::default();
    RetryPolicy {
        max_attempts: raw.max_attempts.unwrap_or(defaults.max_attempts),
        backoff: raw
            .backoff
            .as_deref()
            .and_then(parse_backoff)
            .unwrap_or(defaults.backoff),
        base_delay: raw
            .base_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay),
        max_delay: raw
            .max_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_delay),
    }
}

fn convert_cooldown(raw: RawCooldownConfig) -> CooldownPolicy {
    let defaults = CooldownPolicy::default();
    CooldownPolicy {
        base: raw.base_ms.map(Duration::from_millis).unwrap_or(defaults.base),
        step: raw.step_ms.map(Duration::from_millis).unwrap_or(defaults.step),
        max: raw.max_ms.map(Duration::from_millis).unwrap_or(defaults.max),
    }
}

fn hours_to_duration(hours: f64) -> chrono::Duration {
    chrono::Duration::minutes((hours * 60.0).round() as i64)
}

// Range already checked by validation
fn cents_to_money(cents: u64) -> Money {
    Money::from_cents(i64::try_from(cents).unwrap_or(i64::MAX))
}
