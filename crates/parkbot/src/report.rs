//! Human and machine readable run summaries

use parkbot_api::{BudgetAnalysis, HaltReason, SessionResult, REPORT_VERSION};
use parkbot_core::RunSummary;
use parkbot_util::{format_hours, format_signed_hours};
use serde::Serialize;
use std::fmt::Write;

#[derive(Serialize)]
struct JsonReport<'a> {
    report_version: u32,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Pretty JSON for scripts
pub fn render_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        report_version: REPORT_VERSION,
        summary,
    })
}

/// Plain text for a terminal
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    let plan = &summary.plan;

    let _ = writeln!(
        out,
        "{} {} {}: {} session{} of {} min, breaks up to {} min ({} min paid)",
        if summary.dry_run { "Plan for" } else { "Parking" },
        plan.range(),
        summary.day,
        plan.len(),
        if plan.len() == 1 { "" } else { "s" },
        plan.session_minutes(),
        plan.max_break_minutes(),
        plan.total_paid_minutes(),
    );

    match &summary.report {
        None => {
            for session in plan {
                let _ = writeln!(out, "  #{:<2} {}  planned", session.index, session.window);
            }
        }
        Some(report) => {
            for outcome in &report.outcomes {
                let detail = match &outcome.result {
                    SessionResult::Booked => String::new(),
                    SessionResult::Failed { reason } => reason.clone(),
                    SessionResult::Skipped { reason } => reason.to_string(),
                };
                let _ = writeln!(
                    out,
                    "  #{:<2} {}  {:<7}  {} attempt{}{}{}",
                    outcome.session.index,
                    outcome.session.window,
                    outcome.result.state().as_str(),
                    outcome.attempts,
                    if outcome.attempts == 1 { "" } else { "s" },
                    if detail.is_empty() { "" } else { "  " },
                    detail,
                );
            }

            if let Some(reason) = &report.halt_reason {
                let _ = writeln!(out, "Halted early: {}", describe_halt(reason));
            }
            let _ = writeln!(
                out,
                "Booked {}/{} sessions",
                report.booked_count(),
                report.outcomes.len()
            );
        }
    }

    if let Some(before) = &summary.before {
        let _ = writeln!(out, "Budget before: {}", describe_budget(before));
    }
    if let Some(after) = &summary.after {
        let _ = writeln!(out, "Budget after:  {}", describe_budget(after));
    }

    match (summary.balance_before, summary.balance_after, summary.cost) {
        (Some(before), Some(after), Some(cost)) => {
            let _ = writeln!(out, "Balance: {} -> {} (cost {})", before, after, cost);
        }
        (Some(before), Some(after), None) => {
            let _ = writeln!(out, "Balance: {} -> {}", before, after);
        }
        (Some(before), None, _) => {
            let _ = writeln!(out, "Balance: {}", before);
        }
        _ => {}
    }

    if !summary.warnings.is_empty() {
        let _ = writeln!(out, "Warnings:");
        for warning in &summary.warnings {
            let _ = writeln!(out, "  - {}", warning);
        }
    }

    out
}

fn describe_halt(reason: &HaltReason) -> String {
    match reason {
        HaltReason::InsufficientBalance { balance, required } => format!(
            "insufficient balance ({} available, {} required)",
            balance, required
        ),
        HaltReason::Cancelled => "cancelled".to_string(),
    }
}

fn describe_budget(analysis: &BudgetAnalysis) -> String {
    format!(
        "used {} of {}, expected {} ({}), projected {} by month end, {}",
        format_hours(analysis.used),
        format_hours(analysis.monthly_allowance),
        format_hours(analysis.expected_usage_to_date),
        format_signed_hours(analysis.variance),
        format_hours(analysis.projected_month_end_usage),
        analysis.status,
    )
}
