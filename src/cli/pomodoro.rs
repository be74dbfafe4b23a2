use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::{
    pomodoro::{
        driver::{drive_cycle, CycleOptions},
        notify::ConsoleNotifier,
    },
    storage::{
        entities::PomodoroSettings,
        state_store::{StateStore, POMODORO_SETTINGS_KEY},
    },
    tracker::{parse_tags, StartOutcome},
    utils::shutdown::detect_shutdown,
};

use super::load_tracker;

#[derive(Debug, Subcommand)]
pub enum PomodoroCommand {
    #[command(about = "Show Pomodoro settings")]
    Show {},
    #[command(about = "Change Pomodoro settings")]
    Set {
        #[command(flatten)]
        changes: SettingsChanges,
    },
    #[command(about = "Run focus/break phases for the running task until Ctrl-C")]
    Run {
        #[command(flatten)]
        command: RunCommand,
    },
}

#[derive(Debug, Default, Parser)]
pub struct SettingsChanges {
    #[arg(long, help = "Show the focus countdown in status")]
    enabled: Option<bool>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), help = "Focus length in minutes")]
    focus: Option<u32>,
    #[arg(long = "break", value_parser = clap::value_parser!(u32).range(1..), help = "Break length in minutes")]
    break_minutes: Option<u32>,
    #[arg(long, help = "Restart the task automatically after a break")]
    auto: Option<bool>,
}

impl SettingsChanges {
    fn apply(self, settings: &mut PomodoroSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(focus) = self.focus {
            settings.focus = focus;
        }
        if let Some(break_minutes) = self.break_minutes {
            settings.break_minutes = break_minutes;
        }
        if let Some(auto) = self.auto {
            settings.auto = auto;
        }
    }
}

#[derive(Debug, Parser)]
pub struct RunCommand {
    #[arg(help = "Task to start when no timer is running")]
    title: Option<String>,
    #[arg(long, short, help = "Comma separated tags for a newly started task")]
    tags: Option<String>,
    #[arg(long, help = "Stop after this many focus phases")]
    cycles: Option<u32>,
}

pub async fn process_pomodoro(store: &impl StateStore, command: PomodoroCommand) -> Result<()> {
    let mut settings: PomodoroSettings = store.load(POMODORO_SETTINGS_KEY).await;
    match command {
        PomodoroCommand::Show {} => {
            println!("{}", describe(&settings));
            Ok(())
        }
        PomodoroCommand::Set { changes } => {
            changes.apply(&mut settings);
            store.save(POMODORO_SETTINGS_KEY, &settings).await?;
            println!("{}", describe(&settings));
            Ok(())
        }
        PomodoroCommand::Run { command } => run_cycle(store, settings, command).await,
    }
}

fn describe(settings: &PomodoroSettings) -> String {
    format!(
        "enabled: {}\nfocus: {} min\nbreak: {} min\nauto restart: {}",
        settings.enabled, settings.focus, settings.break_minutes, settings.auto
    )
}

async fn run_cycle(
    store: &impl StateStore,
    settings: PomodoroSettings,
    command: RunCommand,
) -> Result<()> {
    let mut tracker = load_tracker(store).await;
    if let Some(title) = &command.title {
        let tags = command.tags.as_deref().map(parse_tags).unwrap_or_default();
        if tracker.start(title, tags)? == StartOutcome::Started {
            tracker.persist(store).await?;
        }
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    if let Some(running) = tracker.running() {
        println!(
            "Focusing on {} for {} minutes, Ctrl-C to stop",
            running.title, settings.focus
        );
    }
    let options = CycleOptions {
        max_focus: command.cycles,
        ..Default::default()
    };
    let summary = drive_cycle(
        &mut tracker,
        store,
        &ConsoleNotifier,
        settings,
        options,
        shutdown.clone(),
    )
    .await?;
    shutdown.cancel();

    println!(
        "Completed {} focus phases, saved {} sessions",
        summary.completed_focus,
        summary.sessions.len()
    );
    Ok(())
}
