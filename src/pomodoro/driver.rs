use std::time::Duration;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::{
    storage::{
        entities::{PomodoroSettings, Session},
        state_store::StateStore,
    },
    tracker::{StartOutcome, Tracker},
};

use super::{notify::Notifier, CycleEvent, PomodoroCycle};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct CycleOptions {
    /// How often the cycle is recomputed.
    pub tick: Duration,
    /// Stop after this many focus phases instead of restarting forever.
    pub max_focus: Option<u32>,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            max_focus: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CycleSummary {
    pub completed_focus: u32,
    pub sessions: Vec<Session>,
}

/// Runs Pomodoro phases against the running task until the cycle ends or `shutdown` fires.
///
/// The focus phase is measured from the start of the running timer. When it ends the timer is
/// paused (saving a session) and a break begins. After the break the same task is restarted if
/// `settings.auto` is on. State is persisted after every change so that a crash mid-cycle
/// doesn't lose tracked time.
///
/// Other invocations may change the stored state while a phase runs, so the tracker is reloaded
/// before every transition. The cycle ends when the timer it started from was paused or replaced
/// in the meantime, or when another task is running once the break is over.
#[instrument(skip_all, fields(focus = settings.focus, break_minutes = settings.break_minutes))]
pub async fn drive_cycle(
    tracker: &mut Tracker,
    store: &impl StateStore,
    notifier: &dyn Notifier,
    settings: PomodoroSettings,
    options: CycleOptions,
    shutdown: CancellationToken,
) -> Result<CycleSummary> {
    let Some(task) = tracker.running().cloned() else {
        bail!("Start a task before running a Pomodoro cycle");
    };

    let mut cycle = PomodoroCycle::begin(settings, task.start);
    let mut focus_start = task.start;
    let mut summary = CycleSummary::default();

    loop {
        match cycle.poll(tracker.now()) {
            Some(CycleEvent::FocusFinished) => {
                tracker.reload(store).await;
                if tracker.running().map(|v| v.start) != Some(focus_start) {
                    info!("Timer of {} changed outside of the cycle", task.title);
                    cycle.finish();
                    notifier.notify("Pomodoro stopped", "The timer was changed elsewhere");
                } else {
                    if let Some(session) = tracker.pause() {
                        summary.sessions.push(session);
                    }
                    tracker.persist(store).await?;
                    notifier.notify(
                        "Focus finished",
                        &format!("Take a {} minute break", settings.break_minutes),
                    );
                }
            }
            Some(CycleEvent::BreakFinished { restart }) => {
                let limit_reached = options
                    .max_focus
                    .is_some_and(|max| cycle.completed_focus() >= max);
                if restart && !limit_reached {
                    tracker.reload(store).await;
                    match tracker.start(&task.title, task.tags.clone())? {
                        StartOutcome::Started => {
                            tracker.persist(store).await?;
                            focus_start = tracker.running().map_or(focus_start, |v| v.start);
                            notifier.notify("Break finished", &format!("Back to {}", task.title));
                        }
                        StartOutcome::AlreadyRunning => {
                            info!("Another task is running, not restarting {}", task.title);
                            cycle.finish();
                            notifier.notify("Pomodoro stopped", "Another task is running");
                        }
                    }
                } else {
                    cycle.finish();
                    notifier.notify("Break finished", "Pomodoro cycle complete");
                }
            }
            None => {}
        }

        if cycle.is_finished() {
            break;
        }

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Pomodoro cycle interrupted during {}", cycle.phase());
                break;
            }
            _ = tracker.clock().sleep(options.tick) => {}
        }
    }

    summary.completed_focus = cycle.completed_focus();
    Ok(summary)
}
