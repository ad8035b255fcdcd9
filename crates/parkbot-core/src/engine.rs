//! Engine: plans a request, checks the account, books, and summarizes

use parkbot_api::{
    AccountStatus, BudgetAnalysis, RunReport, ScheduleStatus, SessionPlan, TargetDay,
};
use parkbot_booking_api::BookingCollaborator;
use parkbot_config::{BudgetSettings, Settings};
use parkbot_util::{Money, Result, TimeRange};
use serde::Serialize;
use std::fmt;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{analyze_with_tolerance, split, BookingOrchestrator, OrchestratorPolicy};

/// One booking request as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub range: TimeRange,
    pub day: TargetDay,
    /// Overrides `[planner] session_minutes`
    pub session_minutes: Option<u32>,
    /// Overrides `[planner] max_break_minutes`
    pub max_break_minutes: Option<u32>,
    /// Plan and check only; never book
    pub dry_run: bool,
}

impl RunRequest {
    pub fn new(range: TimeRange, day: TargetDay) -> Self {
        Self {
            range,
            day,
            session_minutes: None,
            max_break_minutes: None,
            dry_run: false,
        }
    }
}

/// Something worth telling the user before booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    LowBalance { balance: Money, threshold: Money },
    AboveSchedule {
        #[serde(with = "parkbot_api::duration_minutes")]
        variance: chrono::Duration,
    },
    ProjectedOverrun {
        #[serde(with = "parkbot_api::duration_minutes")]
        overrun: chrono::Duration,
    },
    ExceedsRemainingAllowance { plan_minutes: u32, remaining_minutes: i64 },
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::LowBalance { balance, threshold } => {
                write!(f, "balance {} is below {}", balance, threshold)
            }
            RunWarning::AboveSchedule { variance } => write!(
                f,
                "usage is {} above schedule",
                parkbot_util::format_hours(*variance)
            ),
            RunWarning::ProjectedOverrun { overrun } => write!(
                f,
                "projected to exceed the monthly allowance by {}",
                parkbot_util::format_hours(*overrun)
            ),
            RunWarning::ExceedsRemainingAllowance {
                plan_minutes,
                remaining_minutes,
            } => write!(
                f,
                "plan needs {} minutes but only {} remain this month",
                plan_minutes, remaining_minutes
            ),
        }
    }
}

/// What one invocation produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub plan: SessionPlan,
    pub day: TargetDay,
    pub dry_run: bool,
    /// None for dry runs
    pub report: Option<RunReport>,
    pub before: Option<BudgetAnalysis>,
    pub after: Option<BudgetAnalysis>,
    pub balance_before: Option<Money>,
    pub balance_after: Option<Money>,
    /// Balance consumed by the run, when it went down
    pub cost: Option<Money>,
    pub warnings: Vec<RunWarning>,
}

impl RunSummary {
    /// True for dry runs and runs where every session was booked
    pub fn is_success(&self) -> bool {
        self.report
            .as_ref()
            .is_none_or(RunReport::is_complete_success)
    }
}

/// Ties settings, planning, budget checks and the orchestrator together
pub struct Engine {
    settings: Settings,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Split the request into sessions without touching the account
    pub fn plan(&self, request: &RunRequest) -> Result<SessionPlan> {
        let session_minutes = request
            .session_minutes
            .unwrap_or(self.settings.planner.session_minutes);
        let max_break_minutes = request
            .max_break_minutes
            .unwrap_or(self.settings.planner.max_break_minutes);

        split(request.range, session_minutes, max_break_minutes)
    }

    /// Plan, check the account, and book unless this is a dry run.
    ///
    /// Only planning errors are returned; account and booking problems end
    /// up in the summary.
    pub async fn execute(
        &self,
        request: &RunRequest,
        booker: &dyn BookingCollaborator,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<RunSummary> {
        let plan = self.plan(request)?;

        info!(
            range = %plan.range(),
            day = %request.day,
            sessions = plan.len(),
            paid_minutes = plan.total_paid_minutes(),
            dry_run = request.dry_run,
            "Planned sessions"
        );

        let status_before = self.fetch_status(booker, "before").await;
        let before = status_before.as_ref().and_then(|s| self.analysis(s));
        let balance_before = status_before.as_ref().map(|s| s.balance);

        let warnings = self.warnings(&plan, balance_before, before.as_ref());
        for warning in &warnings {
            warn!(%warning, "Pre-flight check");
        }

        if request.dry_run {
            info!("Dry run, not booking");
            return Ok(RunSummary {
                plan,
                day: request.day,
                dry_run: true,
                report: None,
                before,
                after: None,
                balance_before,
                balance_after: None,
                cost: None,
                warnings,
            });
        }

        let mut orchestrator =
            BookingOrchestrator::new(OrchestratorPolicy::from_settings(&self.settings));
        if let Some(cancel) = cancel {
            orchestrator = orchestrator.with_cancellation(cancel);
        }
        let report = orchestrator.run(&plan, booker, request.day).await;

        let status_after = self.fetch_status(booker, "after").await;
        let after = status_after.as_ref().and_then(|s| self.analysis(s));
        let balance_after = status_after.as_ref().map(|s| s.balance);

        let cost = match (balance_before, balance_after) {
            (Some(before), Some(after)) if before > after => Some(before - after),
            _ => None,
        };
        if let Some(cost) = cost {
            info!(%cost, "Balance consumed by run");
        }

        Ok(RunSummary {
            plan,
            day: request.day,
            dry_run: false,
            report: Some(report),
            before,
            after,
            balance_before,
            balance_after,
            cost,
            warnings,
        })
    }

    async fn fetch_status(
        &self,
        booker: &dyn BookingCollaborator,
        when: &'static str,
    ) -> Option<AccountStatus> {
        match booker.account_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, when, "Account status unavailable");
                None
            }
        }
    }

    fn analysis(&self, status: &AccountStatus) -> Option<BudgetAnalysis> {
        // Tolerance follows the allowance the account reports
        let tolerance = BudgetSettings {
            monthly_allowance: status.budget.monthly_allowance,
            ..self.settings.budget
        }
        .tolerance();
        match analyze_with_tolerance(&status.budget, tolerance) {
            Ok(analysis) => {
                info!(
                    used = %parkbot_util::format_hours(analysis.used),
                    expected = %parkbot_util::format_hours(analysis.expected_usage_to_date),
                    projected = %parkbot_util::format_hours(analysis.projected_month_end_usage),
                    status = %analysis.status,
                    "Budget analysis"
                );
                Some(analysis)
            }
            Err(e) => {
                warn!(error = %e, "Skipping budget analysis");
                None
            }
        }
    }

    fn warnings(
        &self,
        plan: &SessionPlan,
        balance: Option<Money>,
        analysis: Option<&BudgetAnalysis>,
    ) -> Vec<RunWarning> {
        let mut warnings = Vec::new();

        let threshold = self.settings.account.balance_warning;
        if let Some(balance) = balance
            && balance < threshold
        {
            warnings.push(RunWarning::LowBalance { balance, threshold });
        }

        if let Some(analysis) = analysis {
            if analysis.status == ScheduleStatus::AboveSchedule {
                warnings.push(RunWarning::AboveSchedule {
                    variance: analysis.variance,
                });
            }
            if let Some(overrun) = analysis.projected_overrun() {
                warnings.push(RunWarning::ProjectedOverrun { overrun });
            }
            let remaining = analysis.remaining_allowance().num_minutes();
            if i64::from(plan.total_paid_minutes()) > remaining {
                warnings.push(RunWarning::ExceedsRemainingAllowance {
                    plan_minutes: plan.total_paid_minutes(),
                    remaining_minutes: remaining,
                });
            }
        }

        warnings
    }
}
