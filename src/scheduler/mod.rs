//! Scheduler client
//!
//! Abstracts the cluster scheduler for testability. Provides:
//! - `SchedulerClient` trait: the four operations the launcher needs
//! - `CliScheduler`: shells out to the scheduler's command-line tool
//! - `MockScheduler` (in `crate::mock`): scripted responses for tests
//!
//! Only `submit` can fail the run. Status and tensorboard queries recover
//! from any failure locally (`JobStatus::Unknown` / `"N/A"`).

mod cli;

pub use cli::CliScheduler;

use std::io;

use arena_protocol::JobStatus;

use crate::command::CommandLine;
use crate::job::JobHandle;

/// Lines of a followed log stream, ending when the log process exits
pub type LogLines = Box<dyn Iterator<Item = String> + Send>;

/// Scheduler acknowledgement of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// Combined output of the submit call
    pub output: String,
}

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler rejected submission (exit code {exit_code}): {output}")]
    Submit { exit_code: i32, output: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Operations the launcher performs against the scheduler
pub trait SchedulerClient: Send + Sync {
    /// Submit a rendered command. A non-zero exit is an error.
    fn submit(&self, command: &CommandLine) -> Result<SubmitReceipt, SchedulerError>;

    /// Query the job's current status; never fails.
    fn get_status(&self, handle: &JobHandle) -> JobStatus;

    /// Follow the job's log output.
    fn stream_logs(&self, handle: &JobHandle) -> Result<LogLines, SchedulerError>;

    /// Best-effort tensorboard endpoint, `"N/A"` when unavailable.
    fn tensorboard_url(&self, handle: &JobHandle) -> String;
}
