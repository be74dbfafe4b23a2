//!  Storage is organized through [state_store::JsonFileStore].
//!  The basic idea is:
//!   - There is a directory with all the documents.
//!   - Every key (sessions, running timer, tag colors, Pomodoro settings) is a separate JSON file.
//!   - Reading never fails. A missing or corrupted document means defaults.

pub mod entities;
pub mod state_store;
