use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc,
};

/// Step used to walk out of a DST gap. Every real-world gap is a multiple of 15 minutes.
const GAP_PROBE_STEP: Duration = Duration::minutes(15);
const GAP_PROBE_LIMIT: u32 = 4 * 24;

/// Converts a wall clock time of `tz` into an absolute instant.
///
/// Ambiguous times (clocks going back) resolve to the earliest instant. Times that don't exist
/// (clocks going forward) resolve to the first valid instant after the gap.
pub fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(v) => v.to_utc(),
        LocalResult::Ambiguous(earliest, _) => earliest.to_utc(),
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..GAP_PROBE_LIMIT {
                probe += GAP_PROBE_STEP;
                if let Some(v) = tz.from_local_datetime(&probe).earliest() {
                    return v.to_utc();
                }
            }
            Utc.from_utc_datetime(&naive)
        }
    }
}

/// Calendar date of an instant in `tz`.
pub fn local_date<Tz: TimeZone>(tz: &Tz, time: DateTime<Utc>) -> NaiveDate {
    time.with_timezone(tz).date_naive()
}

/// Formats as `hh:mm:ss`, hours aren't wrapped at 24. Negative durations are shown as zero.
pub fn format_hms(v: Duration) -> String {
    let seconds = v.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// Compact representation used in terminal tables.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds().max(0) % 60)
    }
}

/// UTC timestamp with milliseconds, e.g. `2024-01-08T00:00:00.000Z`.
pub fn to_iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Human readable wall clock time in `tz`.
pub fn to_local_string<Tz: TimeZone>(tz: &Tz, time: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Zones with one DST change each, for checking day arithmetic around the switch.
#[cfg(test)]
pub(crate) mod test_zone {
    use chrono::{
        Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    };

    /// UTC+1 moving to UTC+2 at 2024-03-31 01:00 UTC, local 02:00-03:00 doesn't exist that day.
    #[derive(Debug, Clone, Copy)]
    pub struct SpringForward;

    /// UTC+2 moving back to UTC+1 at 2024-10-26 23:00 UTC, local 00:00-01:00 of 2024-10-27
    /// happens twice.
    #[derive(Debug, Clone, Copy)]
    pub struct FallBack;

    fn switch() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap()
    }

    fn fall_switch() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 26)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap()
    }

    fn winter() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn summer() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let as_winter = *local - Duration::hours(1) < switch();
            let as_summer = *local - Duration::hours(2) >= switch();
            match (as_winter, as_summer) {
                (true, false) => LocalResult::Single(winter()),
                (false, true) => LocalResult::Single(summer()),
                (true, true) => LocalResult::Ambiguous(winter(), summer()),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < switch() {
                winter()
            } else {
                summer()
            }
        }
    }

    impl TimeZone for FallBack {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            FallBack
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let as_summer = *local - Duration::hours(2) < fall_switch();
            let as_winter = *local - Duration::hours(1) >= fall_switch();
            match (as_summer, as_winter) {
                (true, false) => LocalResult::Single(summer()),
                (false, true) => LocalResult::Single(winter()),
                (true, true) => LocalResult::Ambiguous(summer(), winter()),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < fall_switch() {
                summer()
            } else {
                winter()
            }
        }
    }
}
