//! Failure taxonomy and stable exit codes

use serde::{Deserialize, Serialize};

/// Failure kind - categorizes why a run ended in FAILED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Launcher configuration could not be loaded
    Config,
    /// Job spec rejected before contacting the scheduler
    Validation,
    /// Scheduler did not accept the job
    Submit,
    /// Job did not reach the awaited status in time
    Timeout,
    /// Job finished with FAILED
    JobFailed,
    /// Job was neither SUCCEEDED nor FAILED after its logs closed
    Indeterminate,
    /// Output metadata could not be written
    Metadata,
    /// Launcher bug (invalid phase transition)
    Internal,
}

impl FailureKind {
    /// Get the stable exit code for this failure kind
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::Failed
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            FailureKind::Config => "Launcher configuration invalid",
            FailureKind::Validation => "Job specification invalid",
            FailureKind::Submit => "Job submission failed",
            FailureKind::Timeout => "Timed out waiting for job",
            FailureKind::JobFailed => "Training job failed",
            FailureKind::Indeterminate => "Training job status indeterminate",
            FailureKind::Metadata => "Output metadata write failed",
            FailureKind::Internal => "Internal launcher error",
        }
    }
}

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Job succeeded and metadata was written
    Success = 0,
    /// Any failure
    Failed = 1,
}

impl ExitCode {
    /// Get the integer value of the exit code
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Check if this exit code indicates success
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}
