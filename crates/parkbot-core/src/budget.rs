//! Monthly budget projection
//!
//! Linear extrapolation of usage-to-date over the calendar month. All
//! arithmetic is done in whole minutes so results are exact and repeatable.

use chrono::Duration;
use parkbot_api::{BudgetAnalysis, BudgetSnapshot, ScheduleStatus};
use parkbot_util::{ParkError, Result};

/// Analyze with the default tolerance of 1% of the allowance
pub fn analyze(snapshot: &BudgetSnapshot) -> Result<BudgetAnalysis> {
    analyze_with_tolerance(snapshot, default_tolerance(snapshot.monthly_allowance))
}

/// Usage within `tolerance` of the prorated expectation counts as on schedule
pub fn analyze_with_tolerance(snapshot: &BudgetSnapshot, tolerance: Duration) -> Result<BudgetAnalysis> {
    validate(snapshot)?;

    let used = snapshot.hours_used.num_minutes();
    let allowance = snapshot.monthly_allowance.num_minutes();
    let days_elapsed = snapshot.days_elapsed;
    let days_in_month = snapshot.days_in_month;
    let elapsed_divisor = days_elapsed.max(1);

    let average = used / elapsed_divisor;
    let expected = scale(allowance, days_elapsed, days_in_month);
    let variance = used - expected;
    let projected = scale(used, days_in_month, elapsed_divisor);

    let tolerance = tolerance.num_minutes().abs();
    let status = if variance < -tolerance {
        ScheduleStatus::BelowSchedule
    } else if variance > tolerance {
        ScheduleStatus::AboveSchedule
    } else {
        ScheduleStatus::OnSchedule
    };

    Ok(BudgetAnalysis {
        used: snapshot.hours_used,
        monthly_allowance: snapshot.monthly_allowance,
        average_daily_usage: Duration::minutes(average),
        expected_usage_to_date: Duration::minutes(expected),
        variance: Duration::minutes(variance),
        projected_month_end_usage: Duration::minutes(projected),
        status,
    })
}

pub fn default_tolerance(monthly_allowance: Duration) -> Duration {
    Duration::minutes(monthly_allowance.num_minutes() / 100)
}

fn validate(snapshot: &BudgetSnapshot) -> Result<()> {
    if snapshot.days_in_month <= 0 {
        return Err(ParkError::invalid_snapshot(format!(
            "days_in_month must be positive, got {}",
            snapshot.days_in_month
        )));
    }
    if snapshot.days_elapsed < 0 {
        return Err(ParkError::invalid_snapshot(format!(
            "days_elapsed cannot be negative, got {}",
            snapshot.days_elapsed
        )));
    }
    if snapshot.days_elapsed > snapshot.days_in_month {
        return Err(ParkError::invalid_snapshot(format!(
            "days_elapsed {} exceeds days_in_month {}",
            snapshot.days_elapsed, snapshot.days_in_month
        )));
    }
    Ok(())
}

/// `value * num / den` without intermediate overflow; `den` is positive
fn scale(value: i64, num: i64, den: i64) -> i64 {
    let scaled = i128::from(value) * i128::from(num) / i128::from(den);
    i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
}
