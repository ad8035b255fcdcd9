//! Booking collaborator interface for parkbot
//!
//! This crate defines the boundary between the orchestrator and whatever
//! actually talks to the parking provider. It contains no provider code
//! itself; `parkbot-booking-cmd` drives external helper programs and
//! `MockBooker` scripts outcomes for tests.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
