//! Error types for parkbot

use thiserror::Error;

use crate::Money;

/// Core error type for parkbot operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParkError {
    /// The requested window cannot admit even one session
    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    /// Budget input is malformed
    #[error("Invalid budget snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Insufficient balance: {balance} available, {required} required")]
    InsufficientBalance { balance: Money, required: Money },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParkError {
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ParkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = ParkError::invalid_range("13:00-13:05 is shorter than one 10 minute session");
        assert_eq!(
            err.to_string(),
            "Invalid time range: 13:00-13:05 is shorter than one 10 minute session"
        );

        let err = ParkError::InsufficientBalance {
            balance: Money::from_cents(120),
            required: Money::from_cents(450),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: €1.20 available, €4.50 required"
        );
    }
}
