use std::{
    fmt::{Display, Write as _},
    io::Write as _,
    time::Duration,
};

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Parser;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    aggregation::{day_bounds, total_duration, week_bounds},
    pomodoro::PomodoroCycle,
    storage::{
        entities::{PomodoroSettings, TagColors},
        state_store::{StateStore, POMODORO_SETTINGS_KEY, TAG_COLORS_KEY},
    },
    tracker::{parse_tags, StartOutcome, Tracker},
    utils::{
        shutdown::detect_shutdown,
        time::{format_hms, local_date},
    },
};

use super::{
    load_tracker,
    output::{colors_enabled, format_tags},
};

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
pub struct StartCommand {
    #[arg(help = "Name of the task")]
    title: String,
    #[arg(long, short, help = "Comma separated tags, e.g. \"work, deep\"")]
    tags: Option<String>,
}

#[derive(Debug, Parser)]
pub struct StatusCommand {
    #[arg(long, short, help = "Refresh every second until Ctrl-C")]
    watch: bool,
}

pub async fn process_start(store: &impl StateStore, command: StartCommand) -> Result<()> {
    let mut tracker = load_tracker(store).await;
    let tags = command.tags.as_deref().map(parse_tags).unwrap_or_default();

    match tracker.start(&command.title, tags)? {
        StartOutcome::Started => {
            tracker.persist(store).await?;
            println!("Started {}", command.title.trim());
        }
        StartOutcome::AlreadyRunning => {
            if let Some(running) = tracker.running() {
                println!(
                    "{} is already running ({}), pause it first",
                    running.title,
                    format_hms(running.elapsed(tracker.now()))
                );
            }
        }
    }
    Ok(())
}

pub async fn process_pause(store: &impl StateStore) -> Result<()> {
    let mut tracker = load_tracker(store).await;
    if tracker.running().is_none() {
        println!("No timer is running");
        return Ok(());
    }
    match tracker.pause() {
        Some(session) => println!(
            "Saved {} ({})",
            session.title,
            format_hms(session.duration())
        ),
        None => println!("Timer stopped without tracked time"),
    }
    tracker.persist(store).await
}

pub async fn process_status(store: &impl StateStore, command: StatusCommand) -> Result<()> {
    let settings: PomodoroSettings = store.load(POMODORO_SETTINGS_KEY).await;
    let colors: TagColors = store.load(TAG_COLORS_KEY).await;
    let enabled = colors_enabled();

    if !command.watch {
        let tracker = load_tracker(store).await;
        print!("{}", render_status(&Local, &tracker, &settings, &colors, enabled));
        return Ok(());
    }

    let token = CancellationToken::new();
    tokio::spawn(detect_shutdown(token.clone()));
    loop {
        // Reloaded on every refresh so that start/pause from another terminal shows up.
        let tracker = load_tracker(store).await;
        print!(
            "\x1B[2J\x1B[H{}",
            render_status(&Local, &tracker, &settings, &colors, enabled)
        );
        std::io::stdout().flush()?;

        select! {
            _ = token.cancelled() => break,
            _ = tracker.clock().sleep(REFRESH_INTERVAL) => {}
        }
    }
    Ok(())
}

/// Running timer, today's and this week's totals, and the focus time left when Pomodoro is on.
pub fn render_status<Tz: TimeZone>(
    tz: &Tz,
    tracker: &Tracker,
    settings: &PomodoroSettings,
    colors: &TagColors,
    enabled: bool,
) -> String
where
    Tz::Offset: Display,
{
    let now = tracker.now();
    let today = local_date(tz, now);
    let mut out = String::new();

    match tracker.running() {
        Some(running) => {
            let _ = write!(
                out,
                "Running:   {} {}",
                running.title,
                format_hms(running.elapsed(now))
            );
            if !running.tags.is_empty() {
                let _ = write!(out, " {}", format_tags(colors, &running.tags, enabled));
            }
            out.push('\n');
        }
        None => out.push_str("No timer running\n"),
    }

    let day = total_duration(
        tracker.sessions(),
        &day_bounds(tz, today),
        tracker.running(),
        now,
    );
    let week = total_duration(
        tracker.sessions(),
        &week_bounds(tz, today),
        tracker.running(),
        now,
    );
    let _ = writeln!(out, "Today:     {}", format_hms(day));
    let _ = writeln!(out, "This week: {}", format_hms(week));

    if let Some(running) = tracker.running().filter(|_| settings.enabled) {
        let cycle = PomodoroCycle::begin(*settings, running.start);
        let _ = writeln!(
            out,
            "Pomodoro:  {} of focus left",
            format_hms(cycle.remaining(now))
        );
    }
    out
}
