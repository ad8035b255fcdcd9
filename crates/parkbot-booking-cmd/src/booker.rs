//! Booking collaborator backed by external helper programs
//!
//! The book helper is run once per attempt with the session in its
//! environment:
//!
//! | variable        | example      |
//! |-----------------|--------------|
//! | `PARKBOT_START` | `13:00`      |
//! | `PARKBOT_END`   | `13:10`      |
//! | `PARKBOT_DAY`   | `tomorrow`   |
//! | `PARKBOT_DATE`  | `2025-03-14` |
//!
//! Exit code 0 means booked, 75 (`EX_TEMPFAIL`) asks for a retry, anything
//! else is a permanent failure. The status helper prints one JSON object,
//! see [`StatusDocument`].

use async_trait::async_trait;
use chrono::NaiveDate;
use parkbot_api::{AccountStatus, BudgetSnapshot, TargetDay};
use parkbot_booking_api::{BookingCollaborator, BookingError, BookingResult};
use parkbot_util::{Money, TimeRange};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{HelperCommand, HelperError, HelperOutput};

/// Exit code a book helper uses to request another attempt
pub const EXIT_TEMPFAIL: i32 = 75;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// JSON printed by the status helper on stdout
#[derive(Debug, Clone, Deserialize)]
pub struct StatusDocument {
    pub balance_cents: i64,
    pub minutes_used: i64,
    /// Falls back to the configured allowance
    #[serde(default)]
    pub monthly_allowance_minutes: Option<i64>,
    /// Falls back to today's calendar position
    #[serde(default)]
    pub days_elapsed: Option<i64>,
    #[serde(default)]
    pub days_in_month: Option<i64>,
}

impl StatusDocument {
    pub fn into_status(self, monthly_allowance: chrono::Duration, today: NaiveDate) -> AccountStatus {
        let mut budget = BudgetSnapshot::for_date(
            chrono::Duration::minutes(self.minutes_used),
            self.monthly_allowance_minutes
                .map(chrono::Duration::minutes)
                .unwrap_or(monthly_allowance),
            today,
        );
        if let Some(days) = self.days_elapsed {
            budget.days_elapsed = days;
        }
        if let Some(days) = self.days_in_month {
            budget.days_in_month = days;
        }

        AccountStatus {
            balance: Money::from_cents(self.balance_cents),
            budget,
        }
    }
}

/// Books sessions by running the configured helper programs
pub struct CommandBooker {
    book: HelperCommand,
    status: HelperCommand,
    monthly_allowance: chrono::Duration,
}

impl CommandBooker {
    pub fn new(book_command: Vec<String>, status_command: Vec<String>) -> Self {
        Self::with_options(
            book_command,
            status_command,
            HashMap::new(),
            DEFAULT_TIMEOUT,
            chrono::Duration::hours(150),
        )
    }

    pub fn with_options(
        book_command: Vec<String>,
        status_command: Vec<String>,
        env: HashMap<String, String>,
        timeout: Duration,
        monthly_allowance: chrono::Duration,
    ) -> Self {
        Self {
            book: HelperCommand::new(book_command, env.clone(), timeout),
            status: HelperCommand::new(status_command, env, timeout),
            monthly_allowance,
        }
    }

    fn today() -> NaiveDate {
        parkbot_util::now().date_naive()
    }
}

/// Map a finished book helper onto the collaborator's error classes
fn classify_book_exit(output: &HelperOutput) -> BookingResult<()> {
    if output.status.success() {
        return Ok(());
    }

    if let Some(signal) = output.signal() {
        return Err(BookingError::retryable(format!(
            "helper killed by signal {}",
            signal
        )));
    }

    let code = output.status.code().unwrap_or(-1);
    let reason = output
        .reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("helper exited with code {}", code));

    if code == EXIT_TEMPFAIL {
        Err(BookingError::Retryable(reason))
    } else {
        Err(BookingError::NonRetryable(reason))
    }
}

fn classify_spawn_error(err: HelperError) -> BookingError {
    match err {
        HelperError::TimedOut { .. } => BookingError::retryable(err.to_string()),
        HelperError::SpawnFailed(_) | HelperError::Io(_) => {
            BookingError::non_retryable(err.to_string())
        }
    }
}

#[async_trait]
impl BookingCollaborator for CommandBooker {
    async fn book_session(&self, window: &TimeRange, day: TargetDay) -> BookingResult<()> {
        let date = day.resolve(Self::today());
        let env = [
            ("PARKBOT_START", window.start().to_string()),
            ("PARKBOT_END", window.end().to_string()),
            ("PARKBOT_DAY", day.as_str().to_string()),
            ("PARKBOT_DATE", date.format("%Y-%m-%d").to_string()),
        ];

        debug!(program = %self.book.program(), window = %window, day = %day, "Running book helper");

        let output = self.book.run(&env).await.map_err(classify_spawn_error)?;
        let result = classify_book_exit(&output);
        if let Err(e) = &result {
            warn!(window = %window, error = %e, "Book helper reported failure");
        }
        result
    }

    async fn account_status(&self) -> BookingResult<AccountStatus> {
        let output = self
            .status
            .run(&[])
            .await
            .map_err(|e| BookingError::retryable(e.to_string()))?;

        if !output.status.success() {
            let reason = output
                .reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("status helper exited with {}", output.status));
            return Err(BookingError::Retryable(reason));
        }

        let doc: StatusDocument = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            BookingError::retryable(format!("status helper printed invalid JSON: {}", e))
        })?;

        Ok(doc.into_status(self.monthly_allowance, Self::today()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    fn window() -> TimeRange {
        "13:00-13:10".parse().unwrap()
    }

    #[tokio::test]
    async fn book_passes_session_in_env() {
        let booker = CommandBooker::new(
            sh(r#"[ "$PARKBOT_START" = 13:00 ] && [ "$PARKBOT_END" = 13:10 ] && [ "$PARKBOT_DAY" = tomorrow ] && [ -n "$PARKBOT_DATE" ]"#),
            sh("true"),
        );

        booker
            .book_session(&window(), TargetDay::Tomorrow)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn tempfail_exit_is_retryable() {
        let booker = CommandBooker::new(sh("echo 'site busy' >&2; exit 75"), sh("true"));

        let err = booker
            .book_session(&window(), TargetDay::Today)
            .await
            .unwrap_err();
        assert_eq!(err, BookingError::Retryable("site busy".into()));
    }

    #[tokio::test]
    async fn other_exit_is_permanent() {
        let booker = CommandBooker::new(sh("exit 1"), sh("true"));

        let err = booker
            .book_session(&window(), TargetDay::Today)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::NonRetryable("helper exited with code 1".into())
        );
    }

    #[tokio::test]
    async fn timeout_is_retryable() {
        let booker = CommandBooker::with_options(
            sh("sleep 10"),
            sh("true"),
            HashMap::new(),
            Duration::from_millis(100),
            chrono::Duration::hours(150),
        );

        let err = booker
            .book_session(&window(), TargetDay::Today)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_helper_is_permanent() {
        let booker = CommandBooker::new(vec!["/nonexistent/book".into()], sh("true"));

        let err = booker
            .book_session(&window(), TargetDay::Today)
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn status_parses_json() {
        let booker = CommandBooker::new(
            sh("true"),
            sh(r#"echo '{"balance_cents": 4250, "minutes_used": 600, "days_elapsed": 10, "days_in_month": 30}'"#),
        );

        let status = booker.account_status().await.unwrap();
        assert_eq!(status.balance, Money::from_cents(4250));
        assert_eq!(status.budget.hours_used, chrono::Duration::hours(10));
        assert_eq!(status.budget.days_elapsed, 10);
        assert_eq!(status.budget.days_in_month, 30);
        assert_eq!(status.budget.monthly_allowance, chrono::Duration::hours(150));
    }

    #[tokio::test]
    async fn status_helper_script_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("status.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '{\"balance_cents\": 100, \"minutes_used\": 0, \"monthly_allowance_minutes\": 600}'\n",
        )
        .unwrap();

        let booker = CommandBooker::new(
            sh("true"),
            vec!["sh".into(), script.to_string_lossy().into_owned()],
        );
        let status = booker.account_status().await.unwrap();
        assert_eq!(status.budget.monthly_allowance, chrono::Duration::hours(10));
    }

    #[tokio::test]
    async fn status_errors_are_retryable() {
        let garbage = CommandBooker::new(sh("true"), sh("echo not-json"));
        assert!(garbage.account_status().await.unwrap_err().is_retryable());

        let failing = CommandBooker::new(sh("true"), sh("echo 'login failed' >&2; exit 2"));
        assert_eq!(
            failing.account_status().await.unwrap_err(),
            BookingError::Retryable("login failed".into())
        );
    }

    #[test]
    fn document_defaults_use_calendar() {
        let doc: StatusDocument =
            serde_json::from_str(r#"{"balance_cents": -50, "minutes_used": 90}"#).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let status = doc.into_status(chrono::Duration::hours(100), today);

        assert_eq!(status.balance, Money::from_cents(-50));
        assert_eq!(status.budget.days_elapsed, 14);
        assert_eq!(status.budget.days_in_month, 28);
        assert_eq!(status.budget.monthly_allowance, chrono::Duration::hours(100));
    }
}
