//! Calendar source for date-driven business rules.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};

/// Source of "today" for billing and lockout rules.
///
/// Services take a clock instead of reading the system calendar so that
/// due-date arithmetic can be exercised against fixed dates.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Shared clock handle held by services.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock backed by the local system calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let clock: SharedClock = Arc::new(FixedClock(date));
        assert_eq!(clock.today(), date);
    }
}
