//! Shared data model for parkbot
//!
//! This crate defines the values that flow between the planner, the booking
//! orchestrator, collaborators and the reporter:
//! - Session plans (what to book)
//! - Budget snapshots and analyses (how the month is going)
//! - Session outcomes and run reports (what happened)
//! - Retry and cooldown policies (how hard to try)

mod budget;
mod policy;
mod report;
mod types;

pub use budget::*;
pub use policy::*;
pub use report::*;
pub use types::*;

/// Current version of the JSON report layout
pub const REPORT_VERSION: u32 = 1;
