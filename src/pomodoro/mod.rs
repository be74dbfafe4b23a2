//! Focus/break cycle layered on top of the task timer. [PomodoroCycle] is the phase machine,
//! [driver::drive_cycle] runs it against a [Tracker](crate::tracker::Tracker) once per second.

pub mod driver;
pub mod notify;

use chrono::{DateTime, Duration, Utc};

use crate::storage::entities::PomodoroSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Focus,
    Break,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Focus => write!(f, "focus"),
            Phase::Break => write!(f, "break"),
        }
    }
}

/// Phase transition reported by [PomodoroCycle::poll].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleEvent {
    /// Focus time is over, the task timer should be paused.
    FocusFinished,
    /// Break is over. With `restart` the next focus phase already began.
    BreakFinished { restart: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomodoroCycle {
    settings: PomodoroSettings,
    phase: Phase,
    phase_started: DateTime<Utc>,
    completed_focus: u32,
    finished: bool,
}

impl PomodoroCycle {
    /// Starts with a focus phase that began at `focus_start`, normally the start of the running
    /// timer.
    pub fn begin(settings: PomodoroSettings, focus_start: DateTime<Utc>) -> Self {
        Self {
            settings,
            phase: Phase::Focus,
            phase_started: focus_start,
            completed_focus: 0,
            finished: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn completed_focus(&self) -> u32 {
        self.completed_focus
    }

    /// The cycle ends after a break when automatic restart is off.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn phase_length(&self) -> Duration {
        match self.phase {
            Phase::Focus => self.settings.focus_duration(),
            Phase::Break => self.settings.break_duration(),
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.phase_started + self.phase_length() - now).max(Duration::zero())
    }

    /// Moves to the next phase when the current one ran out. At most one transition happens per
    /// call, the next phase is measured from `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<CycleEvent> {
        if self.finished || self.remaining(now) > Duration::zero() {
            return None;
        }
        match self.phase {
            Phase::Focus => {
                self.completed_focus += 1;
                self.phase = Phase::Break;
                self.phase_started = now;
                Some(CycleEvent::FocusFinished)
            }
            Phase::Break => {
                let restart = self.settings.auto;
                if restart {
                    self.phase = Phase::Focus;
                    self.phase_started = now;
                } else {
                    self.finished = true;
                }
                Some(CycleEvent::BreakFinished { restart })
            }
        }
    }

    /// Stops the cycle at the current phase.
    pub fn finish(&mut self) {
        self.finished = true;
    }
}
