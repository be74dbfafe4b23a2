use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::{
    aggregation::{day_bounds, week_bounds, TimeWindow},
    utils::time::local_date,
};

use super::Args;

const ISO_DATE: &str = "%Y-%m-%d";
const TODAY: &str = "today";

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DateStyle {
    #[default]
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Query window selection shared by `list`, `report` and `export`. Without any option the
/// window is today.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RangeArgs {
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = TODAY,
        conflicts_with_all = ["week", "start_date", "end_date"],
        help = "Whole local day containing the date. Examples are \"yesterday\", \"2025-03-15\", \"15/03/2025\""
    )]
    pub day: Option<String>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = TODAY,
        conflicts_with_all = ["start_date", "end_date"],
        help = "Monday to Sunday week containing the date"
    )]
    pub week: Option<String>,
    #[arg(
        long = "start",
        short,
        help = "Start of the range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    pub start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of the range. Defaults to now when only the start is given"
    )]
    pub end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    pub date_style: DateStyle,
    #[arg(
        long = "days",
        default_value_t = false,
        help = "Extend --start and --end to whole days"
    )]
    pub treat_as_days: bool,
}

impl RangeArgs {
    /// Turns the options into a window in `tz`, relative to `now`.
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz, now: DateTime<Utc>) -> Result<TimeWindow>
    where
        Tz::Offset: Copy,
    {
        if let Some(day) = &self.day {
            return Ok(day_bounds(tz, self.parse_date(tz, day, now)?));
        }
        if let Some(week) = &self.week {
            return Ok(week_bounds(tz, self.parse_date(tz, week, now)?));
        }
        if self.start_date.is_none() && self.end_date.is_none() {
            return Ok(day_bounds(tz, local_date(tz, now)));
        }

        let mut start = match &self.start_date {
            Some(v) => self.parse_instant(tz, v, now, "start")?,
            None => day_bounds(tz, local_date(tz, now)).start,
        };
        let mut end = match &self.end_date {
            Some(v) => self.parse_instant(tz, v, now, "end")?,
            None => now,
        };
        if self.treat_as_days {
            start = day_bounds(tz, local_date(tz, start)).start;
            end = day_bounds(tz, local_date(tz, end)).end;
        }
        if end < start {
            return Err(validation_error(format!(
                "The range ends before it starts ({start} > {end})"
            )));
        }
        Ok(TimeWindow::new(start, end))
    }

    fn parse_date<Tz: TimeZone>(&self, tz: &Tz, value: &str, now: DateTime<Utc>) -> Result<NaiveDate>
    where
        Tz::Offset: Copy,
    {
        if value == TODAY {
            return Ok(local_date(tz, now));
        }
        if let Ok(date) = NaiveDate::parse_from_str(value, ISO_DATE) {
            return Ok(date);
        }
        let instant = self.parse_instant(tz, value, now, "date")?;
        Ok(local_date(tz, instant))
    }

    /// ISO dates mean local midnight, anything else goes through natural language parsing.
    fn parse_instant<Tz: TimeZone>(
        &self,
        tz: &Tz,
        value: &str,
        now: DateTime<Utc>,
        name: &str,
    ) -> Result<DateTime<Utc>>
    where
        Tz::Offset: Copy,
    {
        if let Ok(date) = NaiveDate::parse_from_str(value, ISO_DATE) {
            return Ok(day_bounds(tz, date).start);
        }
        parse_date_string(value, now.with_timezone(tz), self.date_style.into())
            .map(|v| v.with_timezone(&Utc))
            .map_err(|e| validation_error(format!("Failed to validate {name} {e}")))
    }
}

pub(super) fn validation_error(message: String) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}
