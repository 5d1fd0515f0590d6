// File: ./src/window.rs
// Date range input and its resolution into day-aligned boundaries.
use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-facing range: `from` is required, `to` is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<i64>,
}

impl DateRange {
    pub fn starting(from: i64) -> Self {
        Self { from, to: None }
    }

    pub fn between(from: i64, to: i64) -> Self {
        Self { from, to: Some(to) }
    }

    /// Range expressed as calendar-day offsets from today. `None` when an
    /// offset runs off the calendar.
    pub fn relative_days(clock: &dyn Clock, from_days: i64, to_days: Option<i64>) -> Option<Self> {
        let today = clock.today();
        let to = match to_days {
            Some(days) => Some(clock.add_days(today, days)?),
            None => None,
        };
        Some(Self {
            from: clock.add_days(today, from_days)?,
            to,
        })
    }
}

/// Reference points for one filtering pass.
///
/// `now` and `midnight` are captured once so a whole batch is judged
/// against the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub now: i64,
    pub midnight: i64,
    pub start: i64,
    pub end: Option<i64>,
}

impl DateWindow {
    pub fn resolve(range: &DateRange, clock: &dyn Clock) -> Self {
        let now = clock.now();
        Self {
            now,
            midnight: clock.start_of_day(now),
            start: clock.start_of_day(range.from),
            end: range.to.map(|to| clock.start_of_day(to)),
        }
    }

    /// Half-open `[start, end)` membership.
    pub fn contains(&self, ts: i64) -> bool {
        if ts < self.start {
            return false;
        }
        match self.end {
            Some(end) => ts < end,
            None => true,
        }
    }
}

/// The preset filters offered by the timeline view.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimelineFilter {
    #[default]
    All,
    Overdue,
    Next7Days,
    Next30Days,
    Next3Months,
    Next6Months,
}

impl TimelineFilter {
    pub const ALL: [TimelineFilter; 6] = [
        TimelineFilter::All,
        TimelineFilter::Overdue,
        TimelineFilter::Next7Days,
        TimelineFilter::Next30Days,
        TimelineFilter::Next3Months,
        TimelineFilter::Next6Months,
    ];

    /// Day offsets `(from, to)` relative to today.
    ///
    /// "All" and "Overdue" reach two weeks back; "Overdue" also covers
    /// today because an item due later today may already have passed.
    pub fn day_offsets(self) -> (i64, Option<i64>) {
        match self {
            TimelineFilter::All => (-14, None),
            TimelineFilter::Overdue => (-14, Some(1)),
            TimelineFilter::Next7Days => (0, Some(7)),
            TimelineFilter::Next30Days => (0, Some(30)),
            TimelineFilter::Next3Months => (0, Some(90)),
            TimelineFilter::Next6Months => (0, Some(180)),
        }
    }

    pub fn overdue(self) -> bool {
        self == TimelineFilter::Overdue
    }

    pub fn range(self, clock: &dyn Clock) -> Option<DateRange> {
        let (from, to) = self.day_offsets();
        DateRange::relative_days(clock, from, to)
    }
}

impl fmt::Display for TimelineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimelineFilter::All => "all",
            TimelineFilter::Overdue => "overdue",
            TimelineFilter::Next7Days => "next7days",
            TimelineFilter::Next30Days => "next30days",
            TimelineFilter::Next3Months => "next3months",
            TimelineFilter::Next6Months => "next6months",
        };
        f.write_str(s)
    }
}

impl FromStr for TimelineFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimelineFilter::ALL
            .into_iter()
            .find(|f| f.to_string() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown timeline filter: {}", s))
    }
}
