use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::error::TrackerError;

/// Form data for a session typed in by hand. Every date/time part is optional because the form
/// may be submitted half filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualEntry {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub title: String,
    pub tags: Vec<String>,
}

impl ManualEntry {
    /// Turns the form into an absolute interval. Both times are read on the same calendar date.
    pub fn interval<Tz: TimeZone>(
        &self,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), TrackerError> {
        let date = self.date.ok_or(TrackerError::MissingField("date"))?;
        let start_time = self
            .start_time
            .ok_or(TrackerError::MissingField("start time"))?;
        let end_time = self.end_time.ok_or(TrackerError::MissingField("end time"))?;

        let start = strict_local(tz, date.and_time(start_time))?;
        let end = strict_local(tz, date.and_time(end_time))?;
        validate_interval(start, end)?;
        if end > now {
            return Err(TrackerError::EndInFuture);
        }
        Ok((start, end))
    }
}

/// Creation invariant every stored session satisfies.
pub fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), TrackerError> {
    if end <= start {
        Err(TrackerError::EndNotAfterStart)
    } else {
        Ok(())
    }
}

/// Like [local_instant](crate::utils::time::local_instant) but refuses wall clock times skipped
/// by a DST change, a typed-in time there is a user mistake.
pub fn strict_local<Tz: TimeZone>(
    tz: &Tz,
    naive: NaiveDateTime,
) -> Result<DateTime<Utc>, TrackerError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(v) => Ok(v.to_utc()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.to_utc()),
        LocalResult::None => Err(TrackerError::NonexistentLocalTime(naive)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};

    use crate::{
        tracker::error::TrackerError,
        utils::time::test_zone::{FallBack, SpringForward},
    };

    use super::ManualEntry;

    fn entry(start: (u32, u32), end: (u32, u32)) -> ManualEntry {
        ManualEntry {
            date: NaiveDate::from_ymd_opt(2024, 1, 8),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0),
            title: "Manual".into(),
            tags: vec![],
        }
    }

    #[test]
    fn complete_entry_becomes_interval() {
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();
        let (start, end) = entry((9, 0), (10, 30)).interval(&Utc, now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 8, 10, 30, 0).unwrap());
    }

    #[test]
    fn missing_parts_are_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap();
        let mut missing_date = entry((9, 0), (10, 0));
        missing_date.date = None;
        let mut missing_end = entry((9, 0), (10, 0));
        missing_end.end_time = None;

        assert_eq!(
            missing_date.interval(&Utc, now),
            Err(TrackerError::MissingField("date"))
        );
        assert_eq!(
            missing_end.interval(&Utc, now),
            Err(TrackerError::MissingField("end time"))
        );
    }

    #[test]
    fn end_must_follow_start_and_not_be_in_future() {
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 12, 0, 0).unwrap();
        assert_eq!(
            entry((10, 0), (10, 0)).interval(&Utc, now),
            Err(TrackerError::EndNotAfterStart)
        );
        assert_eq!(
            entry((11, 0), (10, 0)).interval(&Utc, now),
            Err(TrackerError::EndNotAfterStart)
        );
        assert_eq!(
            entry((11, 0), (12, 1)).interval(&Utc, now),
            Err(TrackerError::EndInFuture)
        );
    }

    #[test]
    fn skipped_local_time_is_rejected() {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let mut in_gap = entry((2, 30), (4, 0));
        in_gap.date = NaiveDate::from_ymd_opt(2024, 3, 31);

        let naive = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(
            in_gap.interval(&SpringForward, now),
            Err(TrackerError::NonexistentLocalTime(naive))
        );
    }

    #[test]
    fn repeated_local_time_takes_first_occurrence() {
        let now = Utc.with_ymd_and_hms(2024, 10, 28, 0, 0, 0).unwrap();
        let mut repeated = entry((0, 15), (0, 45));
        repeated.date = NaiveDate::from_ymd_opt(2024, 10, 27);

        let (start, end) = repeated.interval(&FallBack, now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 10, 26, 22, 15, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 10, 26, 22, 45, 0).unwrap());

        let mut across = entry((0, 30), (1, 30));
        across.date = NaiveDate::from_ymd_opt(2024, 10, 27);
        let (start, end) = across.interval(&FallBack, now).unwrap();
        assert_eq!(end - start, Duration::hours(2));
    }
}
