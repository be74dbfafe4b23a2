use std::fmt::{Display, Write};

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use clap::Parser;

use crate::{
    aggregation::{
        daily_totals, filter_by_tag, total_duration, totals_by_tag, totals_by_title, TimeWindow,
        Totals,
    },
    storage::{
        entities::{RunningTimer, Session, TagColors},
        state_store::{StateStore, TAG_COLORS_KEY},
    },
    utils::{
        percentage::{duration_percentage, Percentage},
        time::{format_duration, format_hms, to_local_string},
    },
};

use super::{
    load_tracker,
    output::{colors_enabled, paint_tag},
    range::RangeArgs,
};

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[command(flatten)]
    range: RangeArgs,
    #[arg(long, help = "Only count sessions carrying this tag")]
    tag: Option<String>,
    #[arg(short = 'p', long = "percentage", help = "Hide tasks and tags below this share of the total", default_value_t = Percentage::ZERO)]
    min_percentage: Percentage,
}

pub async fn process_report(store: &impl StateStore, command: ReportCommand) -> Result<()> {
    let tracker = load_tracker(store).await;
    let colors: TagColors = store.load(TAG_COLORS_KEY).await;
    let now = tracker.now();
    let window = command.range.resolve(&Local, now)?;

    let sessions = match &command.tag {
        Some(tag) => filter_by_tag(tracker.sessions(), tag),
        None => tracker.sessions().to_vec(),
    };
    let running = tracker
        .running()
        .filter(|v| command.tag.as_ref().map_or(true, |tag| v.tags.contains(tag)));

    let report = ReportView {
        sessions: &sessions,
        running,
        window,
        now,
        min_percentage: command.min_percentage,
        colors: &colors,
        enabled: colors_enabled(),
    };
    print!("{}", report.render(&Local));
    Ok(())
}

/// Totals of a window grouped by task, tag and day.
pub struct ReportView<'a> {
    pub sessions: &'a [Session],
    pub running: Option<&'a RunningTimer>,
    pub window: TimeWindow,
    pub now: DateTime<Utc>,
    pub min_percentage: Percentage,
    pub colors: &'a TagColors,
    pub enabled: bool,
}

impl ReportView<'_> {
    pub fn render<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: Display,
    {
        let mut out = String::new();
        // Writing into a String can't fail.
        let _ = self.write(&mut out, tz);
        out
    }

    fn write<Tz: TimeZone>(&self, out: &mut String, tz: &Tz) -> std::fmt::Result
    where
        Tz::Offset: Display,
    {
        let total = total_duration(self.sessions, &self.window, self.running, self.now);
        writeln!(
            out,
            "{} - {}",
            to_local_string(tz, self.window.start),
            to_local_string(tz, self.window.end)
        )?;
        writeln!(out, "Total {}", format_hms(total))?;
        if let Some(running) = self.running {
            writeln!(out, "Running {} is included", running.title)?;
        }

        writeln!(out, "\nBy task")?;
        self.write_totals(out, &totals_by_title(self.sessions, &self.window), total, |v| {
            v.to_string()
        })?;

        writeln!(out, "\nBy tag")?;
        self.write_totals(out, &totals_by_tag(self.sessions, &self.window), total, |v| {
            paint_tag(self.colors, v, self.enabled)
        })?;

        let days = daily_totals(tz, self.sessions, &self.window, self.running, self.now);
        if days.len() > 1 {
            writeln!(out, "\nBy day")?;
            for (date, duration) in days {
                writeln!(out, "{}\t{}", date.format("%a %Y-%m-%d"), format_hms(duration))?;
            }
        }
        Ok(())
    }

    /// Percentages are relative to the window total. Tag shares may add up to more than 100%
    /// since a session counts towards each of its tags.
    fn write_totals(
        &self,
        out: &mut String,
        totals: &Totals,
        total: chrono::Duration,
        label: impl Fn(&str) -> String,
    ) -> std::fmt::Result {
        let rows = totals
            .sorted_desc()
            .into_iter()
            .map(|(key, duration)| (key, duration, duration_percentage(duration, total)))
            .filter(|(_, _, percentage)| *percentage >= self.min_percentage)
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return writeln!(out, "-");
        }
        for (key, duration, percentage) in rows {
            writeln!(
                out,
                "{}%\t{}\t{}",
                *percentage as i32,
                format_duration(duration),
                label(&key)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use crate::{
        aggregation::{day_bounds, week_bounds},
        storage::entities::{RunningTimer, Session, TagColors},
        utils::percentage::Percentage,
    };

    use super::ReportView;

    fn at(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, h, 0, 0).unwrap()
    }

    fn sessions() -> Vec<Session> {
        vec![
            Session::new("Review", at(8, 9), at(8, 12), vec!["work".into()]),
            Session::new("Email", at(9, 9), at(9, 10), vec!["work".into(), "admin".into()]),
        ]
    }

    #[test]
    fn single_day_report() {
        let sessions = sessions();
        let colors = TagColors::default();
        let report = ReportView {
            sessions: &sessions,
            running: None,
            window: day_bounds(&Utc, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()),
            now: at(10, 0),
            min_percentage: Percentage::ZERO,
            colors: &colors,
            enabled: false,
        };

        assert_eq!(
            report.render(&Utc),
            "2024-01-08 00:00:00 - 2024-01-08 23:59:59\n\
             Total 03:00:00\n\
             \n\
             By task\n\
             100%\t3h0m0s\tReview\n\
             \n\
             By tag\n\
             100%\t3h0m0s\t#work\n"
        );
    }

    #[test]
    fn week_report_includes_running_and_days() {
        let sessions = sessions();
        let colors = TagColors::default();
        let running = RunningTimer {
            start: at(10, 9),
            title: "Docs".into(),
            tags: vec![],
        };
        let report = ReportView {
            sessions: &sessions,
            running: Some(&running),
            window: week_bounds(&Utc, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()),
            now: at(10, 9) + Duration::hours(1),
            min_percentage: Percentage::new_opt(20.).unwrap(),
            colors: &colors,
            enabled: false,
        };
        let rendered = report.render(&Utc);

        assert!(rendered.contains("Total 05:00:00\nRunning Docs is included\n"));
        // Email is 20% of the total and stays, admin as well.
        assert!(rendered.contains("60%\t3h0m0s\tReview\n20%\t1h0m0s\tEmail\n"));
        assert!(rendered.contains("80%\t4h0m0s\t#work\n20%\t1h0m0s\t#admin\n"));
        assert!(rendered.contains("Wed 2024-01-10\t01:00:00\n"));
        assert_eq!(rendered.matches("\t00:00:00").count(), 4);
    }
}
