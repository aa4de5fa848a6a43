//! Get operation.
//!
//! `get <name> --type <type>` prints a human-oriented description of a job.
//! Two things are scraped from it: the `STATUS:` line and, when tensorboard
//! was requested, the endpoint printed on the last line.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::names;
use crate::job_type::JobType;

/// Job status as reported by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted but not yet scheduled
    Pending,
    /// At least one replica is running
    Running,
    /// Completed successfully
    Succeeded,
    /// Completed with failure
    Failed,
    /// Status could not be determined (unparsable output or failed query)
    Unknown,
}

impl JobStatus {
    /// Map a status token, ignoring case. Anything unrecognized is `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "RUNNING" => JobStatus::Running,
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }

    /// No further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Pending)
    }

    /// Pending or running. `Unknown` is deliberately not active.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
            JobStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Arguments that query a job's description.
pub fn status_args(name: &str, job_type: JobType) -> Vec<String> {
    vec![
        names::GET.to_string(),
        name.to_string(),
        "--type".to_string(),
        job_type.token().to_string(),
    ]
}

fn status_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?i)STATUS:").expect("status marker pattern is valid"))
}

/// Extract the job status from `get` output.
///
/// The first line carrying a `STATUS:` marker wins; its value is whatever
/// follows the last colon on that line.
pub fn parse_status_output(output: &str) -> JobStatus {
    let marker = status_marker();
    output
        .lines()
        .find(|line| marker.is_match(line))
        .and_then(|line| line.rsplit(':').next())
        .map(JobStatus::from_token)
        .unwrap_or(JobStatus::Unknown)
}

/// Extract the tensorboard endpoint from `get` output.
///
/// The scheduler prints it last; returns `None` when there is no output.
pub fn parse_tensorboard_url(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
}
