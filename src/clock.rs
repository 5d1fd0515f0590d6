// File: ./src/clock.rs
// Time and locale collaborators: "now" and "start of day" in the site timezone.
use chrono::{Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Source of the current time and of day boundaries.
///
/// All timestamps are epoch seconds. Implementations must be pure with
/// respect to a given timestamp: `start_of_day` for the same input always
/// yields the same output.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;

    /// Midnight (local to the clock's timezone) of the day containing `ts`.
    fn start_of_day(&self, ts: i64) -> i64;

    /// Start of the local day `days` calendar days after the one holding
    /// `ts`. Days are not all 24 hours long around DST changes, so this
    /// walks the calendar instead of adding seconds. `None` on overflow.
    fn add_days(&self, ts: i64, days: i64) -> Option<i64>;

    fn today(&self) -> i64 {
        self.start_of_day(self.now())
    }
}

/// Wall clock pinned to a timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(chrono_tz::UTC)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn start_of_day(&self, ts: i64) -> i64 {
        day_start_in(&self.tz, ts)
    }

    fn add_days(&self, ts: i64, days: i64) -> Option<i64> {
        add_days_in(&self.tz, ts, days)
    }
}

/// A clock frozen at a fixed instant. Used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: i64,
    tz: Tz,
}

impl FixedClock {
    pub fn new(now: i64, tz: Tz) -> Self {
        Self { now, tz }
    }

    pub fn utc(now: i64) -> Self {
        Self::new(now, chrono_tz::UTC)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now
    }

    fn start_of_day(&self, ts: i64) -> i64 {
        day_start_in(&self.tz, ts)
    }

    fn add_days(&self, ts: i64, days: i64) -> Option<i64> {
        add_days_in(&self.tz, ts, days)
    }
}

/// Start of the local day containing `ts` in `tz`.
///
/// Some zones skip midnight on DST transitions; the first existing local
/// time of that day is used instead.
pub fn day_start_in(tz: &Tz, ts: i64) -> i64 {
    let Some(instant) = Utc.timestamp_opt(ts, 0).single() else {
        return ts - ts.rem_euclid(SECONDS_PER_DAY);
    };
    let date = instant.with_timezone(tz).date_naive();
    let mut local = date.and_time(NaiveTime::MIN);

    // A DST gap never lasts more than a couple of hours.
    for _ in 0..4 {
        if let Some(start) = tz.from_local_datetime(&local).earliest() {
            return start.timestamp();
        }
        local += Duration::minutes(30);
    }
    ts - ts.rem_euclid(SECONDS_PER_DAY)
}

/// Start of the local calendar day `date` in `tz`.
pub fn date_start_in(tz: &Tz, date: NaiveDate) -> Option<i64> {
    // Noon always exists locally, even on DST transition days.
    let noon = tz
        .from_local_datetime(&date.and_time(NaiveTime::from_hms_opt(12, 0, 0)?))
        .earliest()?;
    Some(day_start_in(tz, noon.timestamp()))
}

pub fn add_days_in(tz: &Tz, ts: i64, days: i64) -> Option<i64> {
    let date = Utc.timestamp_opt(ts, 0).single()?.with_timezone(tz).date_naive();
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }?;
    date_start_in(tz, shifted)
}
