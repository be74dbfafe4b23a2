use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Parser;

use crate::{
    aggregation::{select_in_range, total_duration, TimeWindow},
    storage::{
        entities::{Session, TagColors},
        state_store::{StateStore, TAG_COLORS_KEY},
    },
    tracker::{
        entry::{strict_local, ManualEntry},
        error::TrackerError,
        parse_tags, SessionEdit, Tracker,
    },
    utils::time::{format_hms, local_date, to_local_string},
};

use super::{
    load_tracker,
    output::{colors_enabled, running_line, session_line},
    range::RangeArgs,
};

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(long, value_parser = parse_date, help = "Date of the session, today by default. Format is YYYY-MM-DD")]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_time, help = "Start time, e.g. 09:30")]
    start: Option<NaiveTime>,
    #[arg(long, value_parser = parse_time, help = "End time, e.g. 11:00")]
    end: Option<NaiveTime>,
    #[arg(long, default_value = "", help = "Name of the task")]
    title: String,
    #[arg(long, short, help = "Comma separated tags")]
    tags: Option<String>,
}

#[derive(Debug, Parser)]
pub struct EditCommand {
    #[arg(help = "Id of the session or its unique prefix")]
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(
        long,
        value_parser = parse_date,
        help = "Move the session to this date. Times not given keep their clock time"
    )]
    date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_time)]
    start: Option<NaiveTime>,
    #[arg(long, value_parser = parse_time)]
    end: Option<NaiveTime>,
    #[arg(long, short, help = "Comma separated tags, an empty value removes all tags")]
    tags: Option<String>,
}

#[derive(Debug, Parser)]
pub struct ListCommand {
    #[command(flatten)]
    range: RangeArgs,
    #[arg(long, help = "Only show sessions carrying this tag")]
    tag: Option<String>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("{value}: {e}"))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|e| format!("{value}: {e}"))
}

pub async fn process_add(store: &impl StateStore, command: AddCommand) -> Result<()> {
    let mut tracker = load_tracker(store).await;
    let entry = ManualEntry {
        date: command.date.or_else(|| Some(local_date(&Local, tracker.now()))),
        start_time: command.start,
        end_time: command.end,
        title: command.title,
        tags: command.tags.as_deref().map(parse_tags).unwrap_or_default(),
    };
    let session = tracker.add_manual(entry)?;
    tracker.persist(store).await?;
    println!(
        "Added {} {} ({})",
        session.id,
        session.title,
        format_hms(session.duration())
    );
    Ok(())
}

pub async fn process_edit(store: &impl StateStore, command: EditCommand) -> Result<()> {
    let mut tracker = load_tracker(store).await;
    let current = tracker.find(&command.id)?.clone();
    let edit = session_edit(&Local, &current, command)?;
    let session = tracker.edit(&current.id, edit)?;
    tracker.persist(store).await?;
    println!(
        "Updated {} {} ({})",
        session.id,
        session.title,
        format_hms(session.duration())
    );
    Ok(())
}

/// Combines the typed in date and times with the ones of `current`. A time without a date stays
/// on the session's current local date.
fn session_edit<Tz: TimeZone>(
    tz: &Tz,
    current: &Session,
    command: EditCommand,
) -> Result<SessionEdit, TrackerError> {
    let moved = |instant: DateTime<Utc>, time: Option<NaiveTime>| {
        if command.date.is_none() && time.is_none() {
            return Ok(None);
        }
        let local = instant.with_timezone(tz).naive_local();
        let naive = command
            .date
            .unwrap_or(local.date())
            .and_time(time.unwrap_or(local.time()));
        strict_local(tz, naive).map(Some)
    };
    Ok(SessionEdit {
        start: moved(current.start, command.start)?,
        end: moved(current.end, command.end)?,
        title: command.title,
        tags: command.tags.as_deref().map(parse_tags),
    })
}

pub async fn process_delete(store: &impl StateStore, id: String) -> Result<()> {
    let mut tracker = load_tracker(store).await;
    let removed = tracker.delete(&id)?;
    tracker.persist(store).await?;
    println!("Deleted {} {}", removed.id, removed.title);
    Ok(())
}

pub async fn process_list(store: &impl StateStore, command: ListCommand) -> Result<()> {
    let tracker = load_tracker(store).await;
    let colors: TagColors = store.load(TAG_COLORS_KEY).await;
    let window = command.range.resolve(&Local, tracker.now())?;
    print!(
        "{}",
        render_list(
            &Local,
            &tracker,
            &window,
            command.tag.as_deref(),
            &colors,
            colors_enabled()
        )
    );
    Ok(())
}

/// Sessions selected for the window ordered by start, the running timer last.
pub fn render_list<Tz: TimeZone>(
    tz: &Tz,
    tracker: &Tracker,
    window: &TimeWindow,
    tag: Option<&str>,
    colors: &TagColors,
    enabled: bool,
) -> String
where
    Tz::Offset: Display,
{
    let has_tag = |tags: &[String]| tag.map_or(true, |tag| tags.iter().any(|v| v == tag));
    let mut sessions = select_in_range(tracker.sessions(), window)
        .into_iter()
        .filter(|v| has_tag(v.tags.as_slice()))
        .cloned()
        .collect::<Vec<_>>();
    sessions.sort_by_key(|v| v.start);
    let running = tracker.running().filter(|v| has_tag(v.tags.as_slice()));

    let mut out = format!(
        "{} - {}\n",
        to_local_string(tz, window.start),
        to_local_string(tz, window.end)
    );
    if sessions.is_empty() && running.is_none() {
        out.push_str("No sessions\n");
        return out;
    }
    for session in &sessions {
        out.push_str(&session_line(tz, session, colors, enabled));
        out.push('\n');
    }
    if let Some(running) = running {
        out.push_str(&running_line(tz, running, tracker.now(), colors, enabled));
        out.push('\n');
    }
    let total = total_duration(&sessions, window, running, tracker.now());
    out.push_str(&format!("Total {}\n", format_hms(total)));
    out
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

    use crate::{
        aggregation::day_bounds,
        storage::entities::{Session, TagColors},
        tracker::{error::TrackerError, Tracker},
        utils::{clock::ManualClock, time::test_zone::SpringForward},
    };

    use super::{parse_time, render_list, session_edit, EditCommand};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, h, m, 0).unwrap()
    }

    fn session() -> Session {
        Session::new("Review", at(9, 0), at(10, 0), vec!["work".into()]).with_id("abc")
    }

    #[test]
    fn times_accept_optional_seconds() {
        assert_eq!(parse_time("09:30"), Ok(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert_eq!(parse_time("09:30:15"), Ok(NaiveTime::from_hms_opt(9, 30, 15).unwrap()));
        assert!(parse_time("9.30").is_err());
    }

    fn edit(date: Option<NaiveDate>, start: Option<NaiveTime>, end: Option<NaiveTime>) -> EditCommand {
        EditCommand {
            id: "abc".into(),
            title: None,
            date,
            start,
            end,
            tags: None,
        }
    }

    #[test]
    fn edit_keeps_untouched_fields() {
        let command = EditCommand {
            tags: Some(String::new()),
            ..edit(None, None, NaiveTime::from_hms_opt(11, 15, 0))
        };
        let edit = session_edit(&Utc, &session(), command).unwrap();

        assert_eq!(edit.start, None);
        assert_eq!(edit.end, Some(at(11, 15)));
        assert_eq!(edit.tags, Some(vec![]));
        assert_eq!(edit.title, None);
    }

    #[test]
    fn edit_date_moves_both_ends() {
        let next_day = NaiveDate::from_ymd_opt(2024, 1, 9);
        let edit = session_edit(&Utc, &session(), edit(next_day, None, None)).unwrap();

        assert_eq!(edit.start, Some(at(9, 0) + Duration::days(1)));
        assert_eq!(edit.end, Some(at(10, 0) + Duration::days(1)));
    }

    #[test]
    fn edit_into_dst_gap_is_rejected() {
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let result = session_edit(
            &SpringForward,
            &session(),
            edit(Some(gap.date()), Some(gap.time()), None),
        );
        assert_eq!(result, Err(TrackerError::NonexistentLocalTime(gap)));
    }

    #[test]
    fn list_filters_by_tag_and_adds_running_timer() {
        let clock = ManualClock::new(at(11, 0));
        let sessions = vec![
            session(),
            Session::new("Gym", at(7, 0), at(8, 0), vec![]).with_id("def"),
        ];
        let mut tracker = Tracker::new(sessions, None, Box::new(clock.clone()));
        tracker.start("Docs", vec!["work".into()]).unwrap();
        clock.advance(Duration::minutes(30));
        let window = day_bounds(&Utc, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());

        let list = render_list(&Utc, &tracker, &window, Some("work"), &TagColors::default(), false);
        let lines = list.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("abc"));
        assert!(lines[2].starts_with("running"));
        assert_eq!(lines[3], "Total 01:30:00");
    }
}
