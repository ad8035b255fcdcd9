//! Interval splitting
//!
//! Sessions are laid out on a fixed stride of `session + max_break` minutes
//! starting at the beginning of the requested window. Every full session that
//! fits is booked. Whatever is left after the last full session and its break
//! becomes a trimmed final session only when it covers at least half a
//! session; with no breaks the window is filled with full sessions only.

use parkbot_api::SessionPlan;
use parkbot_util::{ParkError, Result, TimeRange};
use tracing::debug;

/// Split `range` into paid sessions of `session_minutes` with free breaks of
/// at most `max_break_minutes` between them.
pub fn split(range: TimeRange, session_minutes: u32, max_break_minutes: u32) -> Result<SessionPlan> {
    if session_minutes == 0 {
        return Err(ParkError::invalid_range("session length must be positive"));
    }

    let total = range.duration_minutes();
    if total < session_minutes {
        return Err(ParkError::invalid_range(format!(
            "{} is {} minutes, shorter than one {}-minute session",
            range, total, session_minutes
        )));
    }

    // A break longer than the window can never occur
    let max_break_minutes = max_break_minutes.min(total);
    let count = session_count(total, session_minutes, max_break_minutes);
    let stride = session_minutes + max_break_minutes;
    let base = range.start().minutes_from_midnight();

    let mut windows = Vec::with_capacity(count as usize);
    for i in 0..count {
        let offset = i * stride;
        if offset >= total {
            break;
        }
        let end = (offset + session_minutes).min(total);
        windows.push(TimeRange::from_minutes(base + offset, base + end)?);
    }

    debug!(
        range = %range,
        session_minutes,
        max_break_minutes,
        sessions = windows.len(),
        "Split range into sessions"
    );

    SessionPlan::from_windows(range, session_minutes, max_break_minutes, windows)
}

/// Full sessions that fit, plus one trimmed session for a tail of at least
/// half a session. Callers guarantee `session_minutes <= total` and
/// `max_break_minutes <= total`.
fn session_count(total: u32, session_minutes: u32, max_break_minutes: u32) -> u32 {
    let stride = session_minutes + max_break_minutes;
    let full = (total + max_break_minutes) / stride;
    let tail = total.saturating_sub(full * stride);

    let keep_tail = max_break_minutes > 0 && 2 * tail >= session_minutes;
    let count = if keep_tail { full + 1 } else { full };
    count.max(1)
}
