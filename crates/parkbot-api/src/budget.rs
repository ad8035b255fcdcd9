//! Monthly allowance types

use chrono::{Datelike, Duration, NaiveDate};
use parkbot_util::{days_in_month, Money};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Usage-to-date as reported by the account, plus the month it falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    #[serde(rename = "used_minutes", with = "duration_minutes")]
    pub hours_used: Duration,
    /// Calendar days elapsed this month, including today
    pub days_elapsed: i64,
    pub days_in_month: i64,
    #[serde(rename = "monthly_allowance_minutes", with = "duration_minutes")]
    pub monthly_allowance: Duration,
}

impl BudgetSnapshot {
    /// Snapshot for `date`: today counts as an elapsed day
    pub fn for_date(hours_used: Duration, monthly_allowance: Duration, date: NaiveDate) -> Self {
        Self {
            hours_used,
            days_elapsed: i64::from(date.day()),
            days_in_month: i64::from(days_in_month(date)),
            monthly_allowance,
        }
    }
}

/// Pace relative to a linear spread of the allowance over the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    BelowSchedule,
    OnSchedule,
    AboveSchedule,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::BelowSchedule => "below schedule",
            ScheduleStatus::OnSchedule => "on schedule",
            ScheduleStatus::AboveSchedule => "above schedule",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projection derived from a `BudgetSnapshot`; recomputed on demand, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAnalysis {
    #[serde(rename = "used_minutes", with = "duration_minutes")]
    pub used: Duration,
    #[serde(rename = "monthly_allowance_minutes", with = "duration_minutes")]
    pub monthly_allowance: Duration,
    #[serde(rename = "average_daily_usage_minutes", with = "duration_minutes")]
    pub average_daily_usage: Duration,
    #[serde(rename = "expected_usage_to_date_minutes", with = "duration_minutes")]
    pub expected_usage_to_date: Duration,
    /// Negative when usage is below the prorated expectation
    #[serde(rename = "variance_minutes", with = "duration_minutes")]
    pub variance: Duration,
    #[serde(rename = "projected_month_end_usage_minutes", with = "duration_minutes")]
    pub projected_month_end_usage: Duration,
    pub status: ScheduleStatus,
}

impl BudgetAnalysis {
    /// Allowance left this month; zero once exhausted
    pub fn remaining_allowance(&self) -> Duration {
        (self.monthly_allowance - self.used).max(Duration::zero())
    }

    /// How far the projection overshoots the allowance, if it does
    pub fn projected_overrun(&self) -> Option<Duration> {
        let overrun = self.projected_month_end_usage - self.monthly_allowance;
        (overrun > Duration::zero()).then_some(overrun)
    }
}

/// What the booking site reports about the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub balance: Money,
    pub budget: BudgetSnapshot,
}

/// Serialize a signed chrono duration as whole minutes
pub mod duration_minutes {
    use chrono::Duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_minutes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let minutes = i64::deserialize(d)?;
        Duration::try_minutes(minutes)
            .ok_or_else(|| D::Error::custom(format!("{} minutes is out of range", minutes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_for_date_counts_today() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        let snapshot = BudgetSnapshot::for_date(Duration::hours(20), Duration::hours(150), date);

        assert_eq!(snapshot.days_elapsed, 10);
        assert_eq!(snapshot.days_in_month, 29);
        assert_eq!(snapshot.hours_used, Duration::hours(20));
    }

    #[test]
    fn remaining_and_overrun() {
        let analysis = BudgetAnalysis {
            used: Duration::hours(160),
            monthly_allowance: Duration::hours(150),
            average_daily_usage: Duration::hours(8),
            expected_usage_to_date: Duration::hours(100),
            variance: Duration::hours(60),
            projected_month_end_usage: Duration::hours(240),
            status: ScheduleStatus::AboveSchedule,
        };

        assert_eq!(analysis.remaining_allowance(), Duration::zero());
        assert_eq!(analysis.projected_overrun(), Some(Duration::hours(90)));
    }

    #[test]
    fn snapshot_serializes_minutes() {
        let snapshot = BudgetSnapshot {
            hours_used: Duration::minutes(90),
            days_elapsed: 3,
            days_in_month: 30,
            monthly_allowance: Duration::hours(150),
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["used_minutes"], 90);
        assert_eq!(json["monthly_allowance_minutes"], 9000);

        let parsed: BudgetSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn status_serialization() {
        let json = serde_json::to_string(&ScheduleStatus::AboveSchedule).unwrap();
        assert_eq!(json, "\"above_schedule\"");
    }
}
