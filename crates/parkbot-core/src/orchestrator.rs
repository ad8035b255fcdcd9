//! Sequential booking orchestration
//!
//! Sessions are booked strictly in order, one at a time. A failed session
//! never stops the run; running out of money or a cancellation request
//! does, and every session not yet attempted is reported as skipped.

use parkbot_api::{
    CooldownPolicy, HaltReason, RetryPolicy, RunReport, Session, SessionOutcome, SessionPlan,
    TargetDay,
};
use parkbot_booking_api::BookingCollaborator;
use parkbot_config::Settings;
use parkbot_util::{Money, ParkError, Result, RunId};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{AttemptDecision, SessionTracker};

/// Everything the orchestrator needs to decide how hard to try
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestratorPolicy {
    pub retry: RetryPolicy,
    pub cooldown: CooldownPolicy,
    /// Price of one session. With zero cost the balance must still be positive.
    pub session_cost: Money,
}

impl OrchestratorPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            retry: settings.retry.clone(),
            cooldown: settings.cooldown.clone(),
            session_cost: settings.account.session_cost,
        }
    }
}

/// Books the sessions of a plan through a collaborator
pub struct BookingOrchestrator {
    policy: OrchestratorPolicy,
    cancel: Option<watch::Receiver<bool>>,
}

impl BookingOrchestrator {
    pub fn new(policy: OrchestratorPolicy) -> Self {
        Self {
            policy,
            cancel: None,
        }
    }

    /// Stop between sessions once `true` is sent on the channel
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn policy(&self) -> &OrchestratorPolicy {
        &self.policy
    }

    /// Book every session of `plan` for `day`.
    ///
    /// Collaborator errors are folded into the report; this never fails.
    pub async fn run(
        &self,
        plan: &SessionPlan,
        booker: &dyn BookingCollaborator,
        day: TargetDay,
    ) -> RunReport {
        let run_id = RunId::new();
        let sessions = plan.sessions();
        let mut cancel = self.cancel.clone();
        let mut outcomes: Vec<SessionOutcome> = Vec::with_capacity(sessions.len());
        let mut halt_reason = None;
        let mut booked_so_far = 0u32;

        info!(
            run_id = %run_id.short(),
            range = %plan.range(),
            day = %day,
            sessions = sessions.len(),
            "Starting booking run"
        );

        for (position, session) in sessions.iter().enumerate() {
            if is_cancelled(&cancel) {
                info!(session = session.index, "Cancellation requested, stopping");
                halt_reason = Some(HaltReason::Cancelled);
                break;
            }

            let remaining = sessions.len() - position;
            if let Some(reason) = self.check_balance(booker, remaining).await {
                halt_reason = Some(reason);
                break;
            }

            let outcome = self.book_session(session, booker, day).await;
            let booked = outcome.result.is_booked();
            outcomes.push(outcome);

            if booked && position + 1 < sessions.len() {
                booked_so_far += 1;
                let delay = self.policy.cooldown.delay_after(booked_so_far);
                if !delay.is_zero() {
                    debug!(delay_ms = delay.as_millis() as u64, "Cooling down");
                }
                if pause(delay, &mut cancel).await {
                    info!(session = session.index, "Cancelled during cooldown");
                    halt_reason = Some(HaltReason::Cancelled);
                    break;
                }
            }
        }

        if let Some(reason) = halt_reason {
            for session in &sessions[outcomes.len()..] {
                let mut tracker = SessionTracker::new(*session);
                tracker.skip(reason);
                outcomes.push(tracker.into_outcome());
            }
        }

        let report = RunReport {
            run_id,
            requested_range: plan.range(),
            outcomes,
            halted_early: halt_reason.is_some(),
            halt_reason,
        };

        info!(
            run_id = %report.run_id.short(),
            booked = report.booked_count(),
            failed = report.failed().count(),
            skipped = report.skipped().count(),
            attempts = report.total_attempts(),
            "Booking run finished"
        );

        report
    }

    /// `Some` when the balance cannot cover the sessions still to book
    async fn check_balance(
        &self,
        booker: &dyn BookingCollaborator,
        remaining: usize,
    ) -> Option<HaltReason> {
        let status = match booker.account_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Could not check balance, continuing");
                return None;
            }
        };

        let required = self.policy.session_cost.times(remaining);
        match ensure_covered(status.balance, required) {
            Ok(()) => None,
            Err(ParkError::InsufficientBalance { balance, required }) => {
                warn!(
                    balance = %balance,
                    required = %required,
                    remaining,
                    "Balance too low for remaining sessions, halting"
                );
                Some(HaltReason::InsufficientBalance { balance, required })
            }
            Err(e) => {
                warn!(error = %e, "Balance check failed, continuing");
                None
            }
        }
    }

    async fn book_session(
        &self,
        session: &Session,
        booker: &dyn BookingCollaborator,
        day: TargetDay,
    ) -> SessionOutcome {
        let mut tracker = SessionTracker::new(*session);

        loop {
            let attempt = tracker.begin_attempt();
            debug!(session = session.index, window = %session.window, attempt, "Booking session");

            match booker.book_session(&session.window, day).await {
                Ok(()) => {
                    tracker.mark_booked();
                    info!(session = session.index, window = %session.window, attempt, "Session booked");
                    break;
                }
                Err(e) => match tracker.record_failure(&e, &self.policy.retry) {
                    AttemptDecision::Retry { delay } => {
                        warn!(
                            session = session.index,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Booking attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    AttemptDecision::GiveUp => {
                        warn!(
                            session = session.index,
                            window = %session.window,
                            attempt,
                            error = %e,
                            "Session failed"
                        );
                        break;
                    }
                },
            }
        }

        tracker.into_outcome()
    }
}

/// A balance covers `required` when it is positive and at least `required`
fn ensure_covered(balance: Money, required: Money) -> Result<()> {
    if balance <= Money::ZERO || balance < required {
        return Err(ParkError::InsufficientBalance { balance, required });
    }
    Ok(())
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Sleep for `delay`; returns true if cancelled first
async fn pause(delay: Duration, cancel: &mut Option<watch::Receiver<bool>>) -> bool {
    let Some(rx) = cancel else {
        tokio::time::sleep(delay).await;
        return false;
    };

    if *rx.borrow() {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = cancelled(rx) => true,
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // A dropped sender can no longer cancel
    if rx.wait_for(|cancel| *cancel).await.is_err() {
        std::future::pending::<()>().await;
    }
}
