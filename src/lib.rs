//! Personal task timer for the terminal. A named timer is started and paused, finished intervals
//! are saved as sessions and summed up by day, week, task and tag. Pomodoro focus/break cycles
//! can drive the timer, and any range of sessions can be exported as CSV, JSON, Markdown or PDF.
//!
//! Everything is stored as JSON documents in a local application directory.

pub mod aggregation;
pub mod cli;
pub mod export;
pub mod pomodoro;
pub mod storage;
pub mod tracker;
pub mod utils;
