use chrono::NaiveDateTime;
use thiserror::Error;

/// Rejections reported back to the user. Nothing is saved when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Please enter a task title before starting the timer")]
    MissingTitle,

    #[error("Please fill in the {0}")]
    MissingField(&'static str),

    #[error("End time must be after start time")]
    EndNotAfterStart,

    #[error("End time can't be in the future")]
    EndInFuture,

    #[error("No session with id {0}")]
    SessionNotFound(String),

    #[error("Id {0} matches more than one session, use a longer prefix")]
    AmbiguousId(String),

    #[error("{0} doesn't exist in the local time zone")]
    NonexistentLocalTime(NaiveDateTime),
}
