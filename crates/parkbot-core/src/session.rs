//! Per-session booking state machine

use parkbot_api::{HaltReason, RetryPolicy, Session, SessionOutcome, SessionResult, SessionState};
use parkbot_booking_api::BookingError;
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// Wait, then attempt the same session again
    Retry { delay: Duration },
    /// The session is failed
    GiveUp,
}

/// Tracks one session from `Pending` to a terminal state
#[derive(Debug, Clone)]
pub struct SessionTracker {
    session: Session,
    state: SessionState,
    attempts: u32,
    last_error: Option<String>,
    skip_reason: Option<HaltReason>,
}

impl SessionTracker {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: SessionState::Pending,
            attempts: 0,
            last_error: None,
            skip_reason: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Enter `Attempting` and return the 1-based attempt number
    pub fn begin_attempt(&mut self) -> u32 {
        debug_assert!(!self.state.is_terminal(), "attempt on finished session");
        self.state = SessionState::Attempting;
        self.attempts += 1;
        self.attempts
    }

    pub fn mark_booked(&mut self) {
        self.state = SessionState::Booked;
        self.last_error = None;
    }

    /// Record a failed attempt and decide whether to try again
    pub fn record_failure(&mut self, error: &BookingError, retry: &RetryPolicy) -> AttemptDecision {
        self.last_error = Some(error.reason().to_string());

        if error.is_retryable() && retry.allows_another(self.attempts) {
            AttemptDecision::Retry {
                delay: retry.delay_after(self.attempts),
            }
        } else {
            self.state = SessionState::Failed;
            AttemptDecision::GiveUp
        }
    }

    /// Never attempted because the run stopped early
    pub fn skip(&mut self, reason: HaltReason) {
        self.state = SessionState::Skipped;
        self.skip_reason = Some(reason);
    }

    pub fn into_outcome(self) -> SessionOutcome {
        let result = match (self.state, self.skip_reason) {
            (SessionState::Booked, _) => SessionResult::Booked,
            (SessionState::Skipped, Some(reason)) => SessionResult::Skipped { reason },
            _ => SessionResult::Failed {
                reason: self
                    .last_error
                    .unwrap_or_else(|| "no attempt completed".to_string()),
            },
        };

        SessionOutcome {
            session: self.session,
            result,
            attempts: self.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkbot_util::Money;

    fn tracker() -> SessionTracker {
        SessionTracker::new(Session {
            index: 1,
            window: "13:00-13:10".parse().unwrap(),
        })
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn booked_first_try() {
        let mut t = tracker();
        assert_eq!(t.state(), SessionState::Pending);
        assert_eq!(t.begin_attempt(), 1);
        assert_eq!(t.state(), SessionState::Attempting);
        t.mark_booked();

        let outcome = t.into_outcome();
        assert_eq!(outcome.result, SessionResult::Booked);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn retryable_until_exhausted() {
        let mut t = tracker();
        let retry = policy(3);
        let err = BookingError::retryable("busy");

        t.begin_attempt();
        assert_eq!(
            t.record_failure(&err, &retry),
            AttemptDecision::Retry {
                delay: Duration::from_secs(2)
            }
        );
        t.begin_attempt();
        assert_eq!(
            t.record_failure(&err, &retry),
            AttemptDecision::Retry {
                delay: Duration::from_secs(4)
            }
        );
        t.begin_attempt();
        assert_eq!(t.record_failure(&err, &retry), AttemptDecision::GiveUp);
        assert_eq!(t.state(), SessionState::Failed);

        let outcome = t.into_outcome();
        assert_eq!(outcome.attempts, 3);
        assert_eq!(
            outcome.result,
            SessionResult::Failed {
                reason: "busy".into()
            }
        );
    }

    #[test]
    fn non_retryable_fails_immediately() {
        let mut t = tracker();
        t.begin_attempt();
        let decision = t.record_failure(&BookingError::non_retryable("slot taken"), &policy(5));

        assert_eq!(decision, AttemptDecision::GiveUp);
        assert_eq!(t.attempts(), 1);
    }

    #[test]
    fn retry_then_book_clears_error() {
        let mut t = tracker();
        t.begin_attempt();
        t.record_failure(&BookingError::retryable("busy"), &policy(3));
        t.begin_attempt();
        t.mark_booked();

        let outcome = t.into_outcome();
        assert!(outcome.result.is_booked());
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn skipped_keeps_reason() {
        let mut t = tracker();
        let reason = HaltReason::InsufficientBalance {
            balance: Money::from_cents(50),
            required: Money::from_cents(200),
        };
        t.skip(reason);

        let outcome = t.into_outcome();
        assert_eq!(outcome.result, SessionResult::Skipped { reason });
        assert_eq!(outcome.attempts, 0);
    }
}
