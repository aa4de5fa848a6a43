//! Scheduler operations.
//!
//! Each submodule owns the argv shape of one scheduler verb and, where the
//! verb produces output the launcher cares about, the parser for it.

pub mod get;
pub mod logs;
pub mod submit;

pub use get::{parse_status_output, parse_tensorboard_url, status_args, JobStatus};
pub use logs::follow_args;
pub use submit::SUBMIT_VERB;

/// Known scheduler verbs.
pub mod names {
    pub const SUBMIT: &str = "submit";
    pub const GET: &str = "get";
    pub const LOGS: &str = "logs";
}
