//! Configuration validation

use crate::schema::{RawBookingConfig, RawConfig};
use parkbot_api::Backoff;
use thiserror::Error;

/// Longest session or break the planner accepts, in minutes
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("[{section}] {field}: {message}")]
    FieldError {
        section: &'static str,
        field: &'static str,
        message: String,
    },

    #[error("Unknown backoff '{0}': expected 'fixed', 'linear' or 'exponential'")]
    UnknownBackoff(String),

    #[error("[booking] {0} cannot be empty")]
    EmptyCommand(&'static str),
}

impl ValidationError {
    fn field(section: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        Self::FieldError {
            section,
            field,
            message: message.into(),
        }
    }
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(minutes) = config.planner.session_minutes
        && (minutes == 0 || minutes > MINUTES_PER_DAY)
    {
        errors.push(ValidationError::field(
            "planner",
            "session_minutes",
            format!("must be between 1 and {}", MINUTES_PER_DAY),
        ));
    }
    if let Some(minutes) = config.planner.max_break_minutes
        && minutes > MINUTES_PER_DAY
    {
        errors.push(ValidationError::field(
            "planner",
            "max_break_minutes",
            format!("must be at most {}", MINUTES_PER_DAY),
        ));
    }

    if let Some(hours) = config.budget.monthly_allowance_hours
        && !(hours.is_finite() && hours > 0.0)
    {
        errors.push(ValidationError::field(
            "budget",
            "monthly_allowance_hours",
            "must be a positive number",
        ));
    }
    if let Some(percent) = config.budget.tolerance_percent
        && !(0.0..=100.0).contains(&percent)
    {
        errors.push(ValidationError::field(
            "budget",
            "tolerance_percent",
            "must be between 0 and 100",
        ));
    }

    if let Some(cents) = config.account.session_cost_cents
        && i64::try_from(cents).is_err()
    {
        errors.push(ValidationError::field(
            "account",
            "session_cost_cents",
            "is out of range",
        ));
    }

    if config.retry.max_attempts == Some(0) {
        errors.push(ValidationError::field(
            "retry",
            "max_attempts",
            "must be at least 1",
        ));
    }
    if let Some(backoff) = &config.retry.backoff
        && parse_backoff(backoff).is_none()
    {
        errors.push(ValidationError::UnknownBackoff(backoff.clone()));
    }
    if let (Some(base), Some(max)) = (config.retry.base_delay_ms, config.retry.max_delay_ms)
        && base > max
    {
        errors.push(ValidationError::field(
            "retry",
            "base_delay_ms",
            format!("{}ms exceeds max_delay_ms {}ms", base, max),
        ));
    }

    if let (Some(base), Some(max)) = (config.cooldown.base_ms, config.cooldown.max_ms)
        && base > max
    {
        errors.push(ValidationError::field(
            "cooldown",
            "base_ms",
            format!("{}ms exceeds max_ms {}ms", base, max),
        ));
    }

    if let Some(booking) = &config.booking {
        errors.extend(validate_booking(booking));
    }

    errors
}

fn validate_booking(booking: &RawBookingConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if is_blank(&booking.book_command) {
        errors.push(ValidationError::EmptyCommand("book_command"));
    }
    if is_blank(&booking.status_command) {
        errors.push(ValidationError::EmptyCommand("status_command"));
    }
    if booking.timeout_seconds == Some(0) {
        errors.push(ValidationError::field(
            "booking",
            "timeout_seconds",
            "must be at least 1",
        ));
    }

    errors
}

fn is_blank(argv: &[String]) -> bool {
    argv.first().is_none_or(|program| program.trim().is_empty())
}

/// Parse a backoff name from config
pub fn parse_backoff(s: &str) -> Option<Backoff> {
    match s.trim().to_lowercase().as_str() {
        "fixed" | "constant" => Some(Backoff::Fixed),
        "linear" => Some(Backoff::Linear),
        "exponential" => Some(Backoff::Exponential),
        _ => None,
    }
}
