//! Mock booking collaborator for testing

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parkbot_api::{AccountStatus, BudgetSnapshot, TargetDay};
use parkbot_util::{Money, TimeRange};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{BookingCollaborator, BookingError, BookingResult};

/// One recorded `book_session` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCall {
    pub window: TimeRange,
    pub day: TargetDay,
}

/// Mock collaborator for unit/integration testing.
///
/// Bookings succeed unless a failure has been scripted for the window.
/// Scripted failures are consumed one per attempt, so
/// `[Retryable, Retryable]` followed by nothing means "fail twice, then book".
pub struct MockBooker {
    failures: Arc<Mutex<HashMap<TimeRange, VecDeque<BookingError>>>>,
    balances: Arc<Mutex<VecDeque<Money>>>,
    balance: Arc<Mutex<Money>>,
    budget: Arc<Mutex<BudgetSnapshot>>,
    calls: Arc<Mutex<Vec<BookCall>>>,
    status_calls: AtomicU32,

    /// Deducted from the balance on every successful booking
    pub charge_per_booking: Arc<Mutex<Money>>,

    /// Configure `account_status` to fail
    pub fail_status: Arc<Mutex<bool>>,

    /// Simulated provider latency for each booking call
    pub book_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockBooker {
    pub fn new() -> Self {
        Self {
            failures: Arc::new(Mutex::new(HashMap::new())),
            balances: Arc::new(Mutex::new(VecDeque::new())),
            balance: Arc::new(Mutex::new(Money::from_cents(10_000))),
            budget: Arc::new(Mutex::new(BudgetSnapshot {
                hours_used: ChronoDuration::zero(),
                days_elapsed: 1,
                days_in_month: 30,
                monthly_allowance: ChronoDuration::hours(150),
            })),
            calls: Arc::new(Mutex::new(Vec::new())),
            status_calls: AtomicU32::new(0),
            charge_per_booking: Arc::new(Mutex::new(Money::ZERO)),
            fail_status: Arc::new(Mutex::new(false)),
            book_delay: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_balance(self, balance: Money) -> Self {
        *self.balance.lock().unwrap() = balance;
        self
    }

    pub fn with_budget(self, budget: BudgetSnapshot) -> Self {
        *self.budget.lock().unwrap() = budget;
        self
    }

    pub fn with_charge(self, charge: Money) -> Self {
        *self.charge_per_booking.lock().unwrap() = charge;
        self
    }

    /// Queue errors returned by successive attempts on `window`
    pub fn script_failures(&self, window: TimeRange, errors: impl IntoIterator<Item = BookingError>) {
        self.failures
            .lock()
            .unwrap()
            .entry(window)
            .or_default()
            .extend(errors);
    }

    /// Queue balances returned by successive status queries, before falling
    /// back to the running balance
    pub fn script_balances(&self, balances: impl IntoIterator<Item = Money>) {
        self.balances.lock().unwrap().extend(balances);
    }

    pub fn set_fail_status(&self, fail: bool) {
        *self.fail_status.lock().unwrap() = fail;
    }

    pub fn set_book_delay(&self, delay: Option<Duration>) {
        *self.book_delay.lock().unwrap() = delay;
    }

    /// Every booking call made so far, in order
    pub fn calls(&self) -> Vec<BookCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn book_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of attempts made for `window`
    pub fn attempts_for(&self, window: &TimeRange) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.window == window)
            .count()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn balance(&self) -> Money {
        *self.balance.lock().unwrap()
    }
}

impl Default for MockBooker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingCollaborator for MockBooker {
    async fn book_session(&self, window: &TimeRange, day: TargetDay) -> BookingResult<()> {
        self.calls.lock().unwrap().push(BookCall {
            window: *window,
            day,
        });

        let delay = *self.book_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .failures
            .lock()
            .unwrap()
            .get_mut(window)
            .and_then(VecDeque::pop_front);
        if let Some(error) = scripted {
            return Err(error);
        }

        let charge = *self.charge_per_booking.lock().unwrap();
        let mut balance = self.balance.lock().unwrap();
        *balance = *balance - charge;
        Ok(())
    }

    async fn account_status(&self) -> BookingResult<AccountStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_status.lock().unwrap() {
            return Err(BookingError::retryable("Mock status failure"));
        }

        let balance = match self.balances.lock().unwrap().pop_front() {
            Some(scripted) => scripted,
            None => *self.balance.lock().unwrap(),
        };

        Ok(AccountStatus {
            balance,
            budget: *self.budget.lock().unwrap(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(s: &str) -> TimeRange {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let booker = MockBooker::new();
        let w = window("13:00-13:10");
        booker.script_failures(
            w,
            [
                BookingError::retryable("busy"),
                BookingError::non_retryable("sold out"),
            ],
        );

        assert_eq!(
            booker.book_session(&w, TargetDay::Today).await,
            Err(BookingError::retryable("busy"))
        );
        assert!(matches!(
            booker.book_session(&w, TargetDay::Today).await,
            Err(BookingError::NonRetryable(_))
        ));
        assert!(booker.book_session(&w, TargetDay::Today).await.is_ok());
        assert_eq!(booker.attempts_for(&w), 3);

        let other = window("13:15-13:25");
        assert!(booker.book_session(&other, TargetDay::Tomorrow).await.is_ok());
        assert_eq!(booker.calls()[3].day, TargetDay::Tomorrow);
    }

    #[tokio::test]
    async fn scripted_balances_then_running_balance() {
        let booker = MockBooker::new()
            .with_balance(Money::from_cents(500))
            .with_charge(Money::from_cents(100));
        booker.script_balances([Money::from_cents(1), Money::from_cents(2)]);

        assert_eq!(booker.account_status().await.unwrap().balance, Money::from_cents(1));
        assert_eq!(booker.account_status().await.unwrap().balance, Money::from_cents(2));
        assert_eq!(booker.account_status().await.unwrap().balance, Money::from_cents(500));

        booker
            .book_session(&window("09:00-09:10"), TargetDay::Today)
            .await
            .unwrap();
        assert_eq!(booker.account_status().await.unwrap().balance, Money::from_cents(400));
        assert_eq!(booker.status_calls(), 4);
    }

    #[tokio::test]
    async fn status_failure() {
        let booker = MockBooker::new();
        booker.set_fail_status(true);

        let err = booker.account_status().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
