//! Calendar windows for cycle resets
//!
//! Every daily/weekly entity compares a stored boundary identifier against
//! the current one computed here. Boundaries are identifiers, never
//! durations: a record holding yesterday's date is reset on its next read,
//! no matter how long the process was suspended.

use chrono::{Datelike, Local, NaiveDate};

/// The most recent Monday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as i64;
    date - chrono::Duration::days(back)
}

/// Source of wall-clock time
///
/// Engine operations never read the system clock directly; they go through
/// this trait so tests and replays can pin time the same way a seeded
/// [`GameRng`](crate::GameRng) pins randomness.
pub trait Clock {
    /// Current unix time in milliseconds
    fn now_ms(&self) -> i64;

    /// Current local calendar date
    fn today(&self) -> NaiveDate;

    /// Start of the current week (most recent Monday)
    fn this_week(&self) -> NaiveDate {
        week_start(self.today())
    }
}

/// Wall-clock backed by the local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually advanced clock for tests and demos
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: i64,
    today: NaiveDate,
}

impl ManualClock {
    /// Create a clock pinned to the given date, at midnight
    pub fn starting(today: NaiveDate) -> Self {
        Self {
            now_ms: today.and_hms_opt(0, 0, 0).expect("midnight").and_utc().timestamp_millis(),
            today,
        }
    }

    /// Advance by whole minutes
    pub fn advance_minutes(&mut self, minutes: i64) {
        self.now_ms += minutes * 60_000;
    }

    /// Advance by milliseconds
    pub fn advance_ms(&mut self, ms: i64) {
        self.now_ms += ms;
    }

    /// Move to the next calendar day
    pub fn next_day(&mut self) {
        self.today = self.today.succ_opt().expect("date in range");
        self.now_ms += 24 * 60 * 60_000;
    }

    /// Jump to a specific date
    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
