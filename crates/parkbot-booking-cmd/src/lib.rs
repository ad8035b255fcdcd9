//! Command-driven booking collaborator for parkbot
//!
//! Provides:
//! - Helper process spawning with a scrubbed environment and a timeout
//! - Exit status classification into retryable and permanent failures
//! - Account status parsed from the status helper's JSON output

mod booker;
mod process;

pub use booker::*;
pub use process::*;
