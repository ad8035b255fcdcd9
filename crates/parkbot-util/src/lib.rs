//! Shared utilities for parkbot
//!
//! This crate provides:
//! - Wall-clock time types (WallClock, TimeRange) and a mockable `now()`
//! - Calendar helpers for monthly budgeting
//! - Money amounts in euro cents
//! - ID types (RunId)
//! - Error types
//! - Default paths for the config file

mod error;
mod ids;
mod money;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use money::*;
pub use paths::*;
pub use time::*;
