//! Foundational utilities shared across troupe crates.
//!
//! Provides the line-capped activity log written once per dispatch step and
//! the timestamp formatting used by both the log and the event ledger.

pub mod activity_log;
pub mod time_utils;

pub use activity_log::{ActivityLog, DEFAULT_ACTIVITY_LOG_LINES};
pub use time_utils::current_timestamp_string;
