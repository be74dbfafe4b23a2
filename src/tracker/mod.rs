//! Owns the session collection and the single running-timer slot. All mutations of tracked
//! time go through [Tracker] so that the creation invariants (`end > start`, at most one running
//! timer) hold for everything that reaches storage.

pub mod entry;
pub mod error;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::{debug, info, instrument, warn};

use crate::{
    storage::{
        entities::{normalize_title, RunningState, RunningTimer, Session},
        state_store::{StateStore, RUNNING_KEY, SESSIONS_KEY},
    },
    utils::clock::Clock,
};

use entry::{validate_interval, ManualEntry};
use error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A timer was already running, it was left untouched.
    AlreadyRunning,
}

/// Replacement values for an existing session. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionEdit {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

pub struct Tracker {
    sessions: Vec<Session>,
    running: Option<RunningTimer>,
    clock: Box<dyn Clock>,
}

impl Tracker {
    pub fn new(
        sessions: Vec<Session>,
        running: Option<RunningTimer>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            running,
            clock,
        }
    }

    /// Restores the tracker from `store`. Anything unreadable is treated as empty.
    pub async fn load(store: &impl StateStore, clock: Box<dyn Clock>) -> Self {
        let mut tracker = Self::new(vec![], None, clock);
        tracker.reload(store).await;
        tracker
    }

    /// Replaces the in-memory sessions and timer with what is stored now. Long running commands
    /// call this before changing anything so that writes made by other invocations survive.
    pub async fn reload(&mut self, store: &impl StateStore) {
        self.sessions = store.load(SESSIONS_KEY).await;
        let running: RunningState = store.load(RUNNING_KEY).await;
        self.running = running.into_timer();
        debug!("Loaded {} sessions", self.sessions.len());
    }

    pub async fn persist(&self, store: &impl StateStore) -> Result<()> {
        store.save(SESSIONS_KEY, &self.sessions).await?;
        store
            .save(RUNNING_KEY, &RunningState::from(self.running.as_ref()))
            .await?;
        Ok(())
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn running(&self) -> Option<&RunningTimer> {
        self.running.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.time()
    }

    /// Starts the timer. Starting while a timer runs is ignored so that the running task keeps
    /// its original start and title.
    #[instrument(skip(self))]
    pub fn start(&mut self, title: &str, tags: Vec<String>) -> Result<StartOutcome, TrackerError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TrackerError::MissingTitle);
        }
        if let Some(running) = &self.running {
            info!("Timer for {} is already running", running.title);
            return Ok(StartOutcome::AlreadyRunning);
        }
        self.running = Some(RunningTimer {
            start: self.clock.time(),
            title: title.to_string(),
            tags,
        });
        Ok(StartOutcome::Started)
    }

    /// Closes the running timer into a session ending now. Returns `None` when nothing was
    /// running, or when the timer was stopped within the same millisecond it started.
    #[instrument(skip(self))]
    pub fn pause(&mut self) -> Option<Session> {
        let running = self.running.take()?;
        let now = self.clock.time();
        if validate_interval(running.start, now).is_err() {
            warn!("Discarding empty interval for {}", running.title);
            return None;
        }
        let session = Session::new(&running.title, running.start, now, running.tags);
        info!("Saved session {} for {}", session.id, session.title);
        self.sessions.push(session.clone());
        Some(session)
    }

    /// Saves a session typed in by hand, reading the form in the local time zone.
    pub fn add_manual(&mut self, entry: ManualEntry) -> Result<Session, TrackerError> {
        self.add_manual_in(&Local, entry)
    }

    #[instrument(skip(self, tz))]
    pub fn add_manual_in<Tz: TimeZone>(
        &mut self,
        tz: &Tz,
        entry: ManualEntry,
    ) -> Result<Session, TrackerError> {
        let (start, end) = entry.interval(tz, self.clock.time())?;
        let session = Session::new(&entry.title, start, end, entry.tags);
        info!("Added session {} for {}", session.id, session.title);
        self.sessions.push(session.clone());
        Ok(session)
    }

    /// Replaces fields of an existing session. The edited interval has to stay non-empty.
    #[instrument(skip(self))]
    pub fn edit(&mut self, id: &str, edit: SessionEdit) -> Result<Session, TrackerError> {
        let position = self.position(id)?;
        let current = &self.sessions[position];
        let start = edit.start.unwrap_or(current.start);
        let end = edit.end.unwrap_or(current.end);
        validate_interval(start, end)?;

        let session = &mut self.sessions[position];
        if let Some(title) = edit.title {
            session.title = normalize_title(&title);
        }
        if let Some(tags) = edit.tags {
            session.tags = tags;
        }
        session.start = start;
        session.end = end;
        info!("Edited session {}", session.id);
        Ok(session.clone())
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: &str) -> Result<Session, TrackerError> {
        let position = self.position(id)?;
        let removed = self.sessions.remove(position);
        info!("Deleted session {}", removed.id);
        Ok(removed)
    }

    pub fn find(&self, id: &str) -> Result<&Session, TrackerError> {
        self.position(id).map(|position| &self.sessions[position])
    }

    /// Looks a session up by its full id or by an unambiguous id prefix.
    fn position(&self, id: &str) -> Result<usize, TrackerError> {
        if let Some(position) = self.sessions.iter().position(|v| v.id == id) {
            return Ok(position);
        }
        let mut matches = self
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, v)| !id.is_empty() && v.id.starts_with(id))
            .map(|(position, _)| position);
        match (matches.next(), matches.next()) {
            (Some(position), None) => Ok(position),
            (Some(_), Some(_)) => Err(TrackerError::AmbiguousId(id.to_string())),
            (None, _) => Err(TrackerError::SessionNotFound(id.to_string())),
        }
    }
}

/// Splits comma separated tag input. Whitespace around tags is dropped, so are empty items.
/// Repeated tags are kept as typed.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
