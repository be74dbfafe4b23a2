//! Pure functions computing how much tracked time falls into a window.
//!
//! Everything here is built from [overlap_duration]: a session's interval clipped to the window.
//! Selection is looser than overlap. A session that only touches the window boundary is
//! selected (so it still shows up in lists) while contributing nothing to totals.

pub mod totals;
pub mod window;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::storage::entities::{RunningTimer, Session};

pub use totals::Totals;
pub use window::{day_bounds, week_bounds, TimeWindow};

fn clipped(start: DateTime<Utc>, end: DateTime<Utc>, window: &TimeWindow) -> Duration {
    let from = start.max(window.start);
    let to = end.min(window.end);
    (to - from).max(Duration::zero())
}

/// Length of the part of `session` inside `window`, never negative.
pub fn overlap_duration(session: &Session, window: &TimeWindow) -> Duration {
    clipped(session.start, session.end, window)
}

/// Sessions that intersect or touch `window`.
pub fn select_in_range<'a>(sessions: &'a [Session], window: &TimeWindow) -> Vec<&'a Session> {
    sessions
        .iter()
        .filter(|session| session.start.max(window.start) <= session.end.min(window.end))
        .collect()
}

/// Contribution of the running timer, treated as the provisional interval `[start, now]`.
pub fn running_overlap(
    running: Option<&RunningTimer>,
    window: &TimeWindow,
    now: DateTime<Utc>,
) -> Duration {
    running.map_or_else(Duration::zero, |timer| clipped(timer.start, now, window))
}

/// Tracked time inside `window`, including the running timer if there is one.
pub fn total_duration(
    sessions: &[Session],
    window: &TimeWindow,
    running: Option<&RunningTimer>,
    now: DateTime<Utc>,
) -> Duration {
    select_in_range(sessions, window)
        .into_iter()
        .fold(running_overlap(running, window, now), |acc, session| {
            acc + overlap_duration(session, window)
        })
}

/// Sums clipped overlaps of the selected sessions under every key produced by `key_fn`.
/// A session yielding several keys adds its full overlap to each of them.
pub fn group_totals<'a, I>(
    sessions: &'a [Session],
    window: &TimeWindow,
    mut key_fn: impl FnMut(&'a Session) -> I,
) -> Totals
where
    I: IntoIterator<Item = &'a str>,
{
    let mut totals = Totals::default();
    for session in select_in_range(sessions, window) {
        let overlap = overlap_duration(session, window);
        for key in key_fn(session) {
            totals.add(key, overlap);
        }
    }
    totals
}

/// Totals keyed by the exact session title.
pub fn totals_by_title(sessions: &[Session], window: &TimeWindow) -> Totals {
    group_totals(sessions, window, |session| [session.title.as_str()])
}

/// Totals keyed by tag. Tag totals aren't a partition of the total time: a session with two tags
/// is counted twice, and so is a tag listed twice on the same session.
pub fn totals_by_tag(sessions: &[Session], window: &TimeWindow) -> Totals {
    group_totals(sessions, window, |session| {
        session.tags.iter().map(String::as_str)
    })
}

/// Tracked time for every local calendar day of `window`, running timer included.
pub fn daily_totals<Tz: TimeZone>(
    tz: &Tz,
    sessions: &[Session],
    window: &TimeWindow,
    running: Option<&RunningTimer>,
    now: DateTime<Utc>,
) -> Vec<(NaiveDate, Duration)> {
    window
        .dates(tz)
        .into_iter()
        .map(|date| {
            let day = day_bounds(tz, date).intersect(window);
            (date, total_duration(sessions, &day, running, now))
        })
        .collect()
}

/// Sessions carrying `tag`. Used when the user narrows a report to a single tag.
pub fn filter_by_tag(sessions: &[Session], tag: &str) -> Vec<Session> {
    sessions
        .iter()
        .filter(|session| session.tags.iter().any(|v| v == tag))
        .cloned()
        .collect()
}
