//! Injectable notion of "today".
//!
//! Forecast horizons and the future-date rule are computed against a
//! [`Clock`] so tests can pin the calendar instead of racing midnight.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current calendar date in the service's local timezone.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock frozen on a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
