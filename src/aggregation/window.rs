use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::utils::time::{local_date, local_instant};

/// A closed interval `[start, end]` used to filter and aggregate sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Part of `self` that also lies in `other`. The result may be inverted when the windows
    /// don't meet, which every consumer treats as empty.
    pub fn intersect(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }

    /// Local calendar dates touched by the window, in order.
    pub fn dates<Tz: TimeZone>(&self, tz: &Tz) -> Vec<NaiveDate> {
        let first = local_date(tz, self.start);
        let last = local_date(tz, self.end);
        first.iter_days().take_while(|day| *day <= last).collect()
    }
}

/// Midnight (00:00:00.000) to 23:59:59.999 of `date` in `tz`.
pub fn day_bounds<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> TimeWindow {
    let midnight = date.and_time(NaiveTime::MIN);
    let last_millisecond = midnight + Duration::days(1) - Duration::milliseconds(1);
    TimeWindow::new(
        local_instant(tz, midnight),
        local_instant(tz, last_millisecond),
    )
}

/// Monday 00:00:00.000 to the following Sunday 23:59:59.999 around `anchor`.
///
/// Counting weekdays from Sunday = 0, the offset to Monday is `1 - weekday`, except Sunday which
/// goes back 6 days. That is exactly the number of days since Monday.
pub fn week_bounds<Tz: TimeZone>(tz: &Tz, anchor: NaiveDate) -> TimeWindow {
    let offset = -(anchor.weekday().num_days_from_monday() as i64);
    let monday = anchor + Duration::days(offset);
    let sunday = monday + Duration::days(6);
    TimeWindow::new(day_bounds(tz, monday).start, day_bounds(tz, sunday).end)
}
