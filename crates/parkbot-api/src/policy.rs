//! Retry and cooldown policies
//!
//! Retry behavior is data: the orchestrator asks the policy how many attempts
//! a session gets and how long to wait between them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shape of the delay sequence between attempts on the same session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base` every time
    Fixed,
    /// `base * n` after the n-th failed attempt
    Linear,
    /// `base * 2^(n-1)` after the n-th failed attempt
    #[default]
    Exponential,
}

/// Per-session retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per session, including the first (at least 1)
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries and never waits
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Same backoff shape, no waiting; used by tests and dry runs
    pub fn without_delays(mut self) -> Self {
        self.base_delay = Duration::ZERO;
        self.max_delay = Duration::ZERO;
        self
    }

    /// Delay to wait after the `failed_attempt`-th attempt (1-based) failed
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let n = failed_attempt.max(1);
        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear => self.base_delay.saturating_mul(n),
            Backoff::Exponential => {
                let multiplier = 1u32.checked_shl(n - 1).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(multiplier)
            }
        };
        delay.min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempts_made`
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Pause inserted after a successful booking before the next session starts.
///
/// It follows every booked session that has another session after it, even
/// when the session before it failed, since whether the next booking will
/// succeed is not known yet. A failed session is never followed by a cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub base: Duration,
    /// Added once per session already booked in this run
    pub step: Duration,
    pub max: Duration,
}

impl CooldownPolicy {
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            step: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// Cooldown after the `booked_so_far`-th successful booking
    pub fn delay_after(&self, booked_so_far: u32) -> Duration {
        self.base
            .saturating_add(self.step.saturating_mul(booked_so_far))
            .min(self.max)
    }
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            step: Duration::from_millis(500),
            max: Duration::from_secs(5),
        }
    }
}
