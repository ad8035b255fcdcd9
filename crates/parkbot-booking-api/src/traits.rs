//! Booking collaborator trait

use async_trait::async_trait;
use parkbot_api::{AccountStatus, TargetDay};
use parkbot_util::TimeRange;
use thiserror::Error;

/// Errors from booking collaborator operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Transient failure; the same request may succeed if repeated
    #[error("Retryable booking failure: {0}")]
    Retryable(String),

    /// Permanent failure for this request
    #[error("Booking failed: {0}")]
    NonRetryable(String),
}

impl BookingError {
    pub fn retryable(msg: impl Into<String>) -> Self {
        Self::Retryable(msg.into())
    }

    pub fn non_retryable(msg: impl Into<String>) -> Self {
        Self::NonRetryable(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Retryable(_))
    }

    /// Human-readable reason without the classification prefix
    pub fn reason(&self) -> &str {
        match self {
            BookingError::Retryable(reason) | BookingError::NonRetryable(reason) => reason,
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

/// The party that actually books parking with the provider.
///
/// Implementations must be safe to call repeatedly for the same window: the
/// orchestrator retries `book_session` after a `Retryable` error.
#[async_trait]
pub trait BookingCollaborator: Send + Sync {
    /// Book one session on `day`
    async fn book_session(&self, window: &TimeRange, day: TargetDay) -> BookingResult<()>;

    /// Current balance and month-to-date usage
    async fn account_status(&self) -> BookingResult<AccountStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(BookingError::retryable("timeout").is_retryable());
        assert!(!BookingError::non_retryable("sold out").is_retryable());
        assert_eq!(BookingError::non_retryable("sold out").reason(), "sold out");
        assert_eq!(
            BookingError::retryable("timeout").to_string(),
            "Retryable booking failure: timeout"
        );
    }
}
