//! Per-session outcomes and run reports

use parkbot_util::{Money, RunId, TimeRange};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Session;

/// Lifecycle of one session within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Attempting,
    Booked,
    Failed,
    Skipped,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Pending => "pending",
            SessionState::Attempting => "attempting",
            SessionState::Booked => "booked",
            SessionState::Failed => "failed",
            SessionState::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Booked | SessionState::Failed | SessionState::Skipped
        )
    }
}

/// Why a run stopped before attempting every session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum HaltReason {
    InsufficientBalance { balance: Money, required: Money },
    Cancelled,
}

impl HaltReason {
    pub fn code(&self) -> &'static str {
        match self {
            HaltReason::InsufficientBalance { .. } => "insufficient_balance",
            HaltReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Final result for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionResult {
    Booked,
    Failed { reason: String },
    Skipped { reason: HaltReason },
}

impl SessionResult {
    pub fn state(&self) -> SessionState {
        match self {
            SessionResult::Booked => SessionState::Booked,
            SessionResult::Failed { .. } => SessionState::Failed,
            SessionResult::Skipped { .. } => SessionState::Skipped,
        }
    }

    pub fn is_booked(&self) -> bool {
        matches!(self, SessionResult::Booked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session: Session,
    pub result: SessionResult,
    /// Booking attempts issued for this session (0 when skipped)
    pub attempts: u32,
}

/// Everything one orchestrator run decided, in session order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub requested_range: TimeRange,
    pub outcomes: Vec<SessionOutcome>,
    pub halted_early: bool,
    pub halt_reason: Option<HaltReason>,
}

impl RunReport {
    pub fn booked(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_booked())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, SessionResult::Failed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, SessionResult::Skipped { .. }))
    }

    pub fn booked_count(&self) -> usize {
        self.booked().count()
    }

    /// True when every session was booked
    pub fn is_complete_success(&self) -> bool {
        !self.halted_early && self.outcomes.iter().all(|o| o.result.is_booked())
    }

    pub fn total_attempts(&self) -> u32 {
        self.outcomes.iter().map(|o| o.attempts).sum()
    }

    /// Final states in session order
    pub fn states(&self) -> Vec<SessionState> {
        self.outcomes.iter().map(|o| o.result.state()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: u32, window: &str, result: SessionResult, attempts: u32) -> SessionOutcome {
        SessionOutcome {
            session: Session {
                index,
                window: window.parse().unwrap(),
            },
            result,
            attempts,
        }
    }

    fn sample_report() -> RunReport {
        RunReport {
            run_id: RunId::new(),
            requested_range: "13:00-13:40".parse().unwrap(),
            outcomes: vec![
                outcome(1, "13:00-13:10", SessionResult::Booked, 1),
                outcome(
                    2,
                    "13:15-13:25",
                    SessionResult::Failed {
                        reason: "slot unavailable".into(),
                    },
                    1,
                ),
                outcome(
                    3,
                    "13:30-13:40",
                    SessionResult::Skipped {
                        reason: HaltReason::Cancelled,
                    },
                    0,
                ),
            ],
            halted_early: true,
            halt_reason: Some(HaltReason::Cancelled),
        }
    }

    #[test]
    fn report_counts() {
        let report = sample_report();
        assert_eq!(report.booked_count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.skipped().count(), 1);
        assert_eq!(report.total_attempts(), 2);
        assert!(!report.is_complete_success());
        assert_eq!(
            report.states(),
            vec![SessionState::Booked, SessionState::Failed, SessionState::Skipped]
        );
    }

    #[test]
    fn halt_reason_display() {
        assert_eq!(HaltReason::Cancelled.to_string(), "cancelled");
        let reason = HaltReason::InsufficientBalance {
            balance: Money::from_cents(10),
            required: Money::from_cents(90),
        };
        assert_eq!(reason.to_string(), "insufficient_balance");
    }

    #[test]
    fn result_serialization() {
        let json = serde_json::to_string(&SessionResult::Skipped {
            reason: HaltReason::Cancelled,
        })
        .unwrap();
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(json.contains("\"code\":\"cancelled\""));
    }

    #[test]
    fn terminal_states() {
        assert!(!SessionState::Pending.is_terminal());
        assert!(!SessionState::Attempting.is_terminal());
        assert!(SessionState::Booked.is_terminal());
        assert!(SessionState::Skipped.is_terminal());
    }
}
