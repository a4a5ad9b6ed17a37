//! Calendar arithmetic for period tokens
//!
//! All "same day" / "next week" decisions go through this module so the
//! local-midnight and ISO-week (Monday start) rules live in one place.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime,
    NaiveTime, Offset, TimeZone, Utc,
};

/// Time zone used to cut timestamps into calendar days and weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    /// The system's local time zone
    #[default]
    Local,
    /// A fixed UTC offset (used for reproducible runs and tests)
    Fixed(FixedOffset),
}

impl Calendar {
    /// Build from an optional offset in minutes east of UTC.
    /// `None` or an out-of-range offset selects the system time zone.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        match minutes.and_then(|m| FixedOffset::east_opt(m.saturating_mul(60))) {
            Some(offset) => Self::Fixed(offset),
            None => Self::Local,
        }
    }

    /// Calendar pinned to UTC
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Local calendar date of a timestamp (the daily period token)
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => at.with_timezone(&Local).date_naive(),
            Self::Fixed(offset) => at.with_timezone(offset).date_naive(),
        }
    }

    /// Monday of the ISO week containing the timestamp (the weekly period token)
    pub fn week_start(&self, at: DateTime<Utc>) -> NaiveDate {
        week_start_of(self.local_date(at))
    }

    /// First instant of a local calendar day
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        match self {
            Self::Local => resolve_local(&Local, midnight),
            Self::Fixed(offset) => resolve_local(offset, midnight),
        }
    }

    /// Last millisecond of a local calendar day
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.start_of_day(date + Duration::days(1)) - Duration::milliseconds(1)
    }

    /// Start of the local day after the one containing `at`
    pub fn next_day_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(self.local_date(at) + Duration::days(1))
    }

    /// Start of the week after the one containing `at`
    pub fn next_week_start(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of_day(self.week_start(at) + Duration::days(7))
    }
}

/// Monday on or before `date`
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Build a date, stepping back to the last valid day of the month
/// (Feb 29 in a common year becomes Feb 28).
pub fn date_clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (0..4).find_map(|back| NaiveDate::from_ymd_opt(year, month, day.checked_sub(back)?))
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    earliest_valid(naive, |local| {
        tz.from_local_datetime(local)
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Earliest instant for a local wall time under `lookup`.
/// A wall time skipped by a DST jump resolves to one hour later.
fn earliest_valid(
    naive: NaiveDateTime,
    lookup: impl Fn(&NaiveDateTime) -> LocalResult<DateTime<Utc>>,
) -> DateTime<Utc> {
    match lookup(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => match lookup(&(naive + Duration::hours(1))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
            LocalResult::None => naive.and_utc(),
        },
    }
}

/// Source of "now" for the engine
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock shared between an engine and the code driving it
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(at)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
