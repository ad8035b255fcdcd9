//! Core planning and booking engine for parkbot
//!
//! This crate is the heart of parkbot, containing:
//! - Interval splitting (which sessions to book for a requested window)
//! - Budget projection (how the month's allowance is being spent)
//! - Per-session state machine (Pending -> Attempting -> Booked | Failed, or Skipped)
//! - Sequential booking orchestration with retries, cooldowns and halting

mod budget;
mod engine;
mod orchestrator;
mod session;
mod splitter;

pub use budget::*;
pub use engine::*;
pub use orchestrator::*;
pub use session::*;
pub use splitter::*;
