//! Session plan types

use chrono::NaiveDate;
use parkbot_util::{ParkError, TimeRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which day the sessions are booked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDay {
    #[default]
    Today,
    Tomorrow,
}

impl TargetDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetDay::Today => "today",
            TargetDay::Tomorrow => "tomorrow",
        }
    }

    /// Calendar date this target refers to, relative to `today`
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            TargetDay::Today => today,
            TargetDay::Tomorrow => today.succ_opt().unwrap_or(today),
        }
    }
}

impl fmt::Display for TargetDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown day '{0}': expected 'today' or 'tomorrow'")]
pub struct UnknownTargetDay(pub String);

impl FromStr for TargetDay {
    type Err = UnknownTargetDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(TargetDay::Today),
            "tomorrow" => Ok(TargetDay::Tomorrow),
            other => Err(UnknownTargetDay(other.to_string())),
        }
    }
}

/// One paid parking interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    /// 1-based ordinal within the plan
    pub index: u32,
    pub window: TimeRange,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.window)
    }
}

/// Ordered, non-overlapping sessions covering part of a requested range.
///
/// Immutable once built: the only constructor checks the ordering and gap
/// invariants, and the fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPlan {
    range: TimeRange,
    session_minutes: u32,
    max_break_minutes: u32,
    sessions: Vec<Session>,
}

impl SessionPlan {
    /// Build a plan from computed windows, numbering them from 1.
    ///
    /// An empty window list is `InvalidRange`. Windows that overlap, leave
    /// `range`, break for longer than `max_break_minutes` or start late are
    /// a planner bug and come back as `Internal`.
    pub fn from_windows(
        range: TimeRange,
        session_minutes: u32,
        max_break_minutes: u32,
        windows: Vec<TimeRange>,
    ) -> parkbot_util::Result<Self> {
        let first = windows
            .first()
            .ok_or_else(|| ParkError::invalid_range(format!("{} admits no sessions", range)))?;
        if first.start() != range.start() {
            return Err(ParkError::internal(format!(
                "first session {} does not start at {}",
                first,
                range.start()
            )));
        }

        for window in &windows {
            if !range.contains_range(window) {
                return Err(ParkError::internal(format!(
                    "session {} lies outside {}",
                    window, range
                )));
            }
        }

        for pair in windows.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.start() < prev.end() {
                return Err(ParkError::internal(format!(
                    "sessions {} and {} overlap or are out of order",
                    prev, next
                )));
            }
            let gap = next.start().minutes_from_midnight() - prev.end().minutes_from_midnight();
            if gap > max_break_minutes {
                return Err(ParkError::internal(format!(
                    "break of {} minutes between {} and {} exceeds {}",
                    gap, prev, next, max_break_minutes
                )));
            }
        }

        let sessions = windows
            .into_iter()
            .enumerate()
            .map(|(i, window)| Session {
                index: i as u32 + 1,
                window,
            })
            .collect();

        Ok(Self {
            range,
            session_minutes,
            max_break_minutes,
            sessions,
        })
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn session_minutes(&self) -> u32 {
        self.session_minutes
    }

    pub fn max_break_minutes(&self) -> u32 {
        self.max_break_minutes
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Session> {
        self.sessions.iter()
    }

    /// Minutes actually covered by paid sessions
    pub fn total_paid_minutes(&self) -> u32 {
        self.sessions.iter().map(|s| s.window.duration_minutes()).sum()
    }

    /// Break lengths between consecutive sessions, in minutes
    pub fn gaps(&self) -> Vec<u32> {
        self.sessions
            .windows(2)
            .map(|pair| {
                pair[1].window.start().minutes_from_midnight()
                    - pair[0].window.end().minutes_from_midnight()
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a SessionPlan {
    type Item = &'a Session;
    type IntoIter = std::slice::Iter<'a, Session>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.iter()
    }
}
