//! Launch orchestration
//!
//! Sequences one launch end to end:
//!
//! 1. BUILDING: validate the spec, fix the job handle, render the command
//! 2. SUBMITTING: hand the command to the scheduler (no retry)
//! 3. WAITING_RUNNING: poll until the job runs, bounded by the timeout
//! 4. STREAMING: forward job logs until the log process exits
//! 5. CHECKING_TERMINAL: one more status query decides the outcome
//! 6. WRITING_METADATA: persist the output metadata
//!
//! Any error moves the run straight to FAILED. A timeout does not cancel
//! the submitted job; it keeps running on the cluster.

pub mod streaming;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use arena_protocol::{JobStatus, NOT_AVAILABLE};
use tracing::{error, info, warn};

use crate::command::CommandBuilder;
use crate::context::LaunchContext;
use crate::job::{normalize_optional, JobHandle, JobSpec, ValidationError};
use crate::poll::{Clock, StatusPoller, TimeoutError, WaitMode, DEFAULT_POLL_INTERVAL};
use crate::scheduler::{SchedulerClient, SchedulerError};
use crate::state::{PhaseError, RunPhase, RunTracker};
use crate::summary::{FailureKind, MetadataError, MetadataWriter, OutputMetadata};

pub use streaming::{LogStreamer, StreamError, StreamStats};

/// Default bound on the wait phase
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Per-run knobs that are not part of the job itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Bound on the wait phase
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub wait_mode: WaitMode,
    /// Reported output location when the job has no output data mount
    pub output_dir: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_mode: WaitMode::Running,
            output_dir: None,
        }
    }
}

/// Fatal launch errors
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("invalid job spec: {0}")]
    Validation(#[from] ValidationError),

    #[error("job submission failed: {0}")]
    Submit(#[from] SchedulerError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("training job {full_name} failed")]
    JobFailed { full_name: String },

    #[error("training job {full_name} ended with status {status}")]
    Indeterminate { full_name: String, status: JobStatus },

    #[error("failed to write output metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Phase(#[from] PhaseError),
}

impl LaunchError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            LaunchError::Validation(_) => FailureKind::Validation,
            LaunchError::Submit(_) => FailureKind::Submit,
            LaunchError::Timeout(_) => FailureKind::Timeout,
            LaunchError::JobFailed { .. } => FailureKind::JobFailed,
            LaunchError::Indeterminate { .. } => FailureKind::Indeterminate,
            LaunchError::Metadata(_) => FailureKind::Metadata,
            LaunchError::Phase(_) => FailureKind::Internal,
        }
    }
}

/// Outcome of a successful launch
#[derive(Debug, Clone)]
pub struct RunReport {
    pub handle: JobHandle,
    /// What the scheduler printed on submit
    pub submit_output: String,
    /// Status that ended the wait phase
    pub ready_status: JobStatus,
    /// Status observed after the log stream closed
    pub final_status: JobStatus,
    pub metadata: OutputMetadata,
    /// None when the log stream could not be followed
    pub log_stats: Option<StreamStats>,
}

/// Output location reported for a job.
///
/// The output data mount wins over the output directory; `"N/A"` when
/// neither is set.
pub fn resolve_output_path(spec: &JobSpec, output_dir: Option<&str>) -> String {
    normalize_optional(spec.output_data_mount.clone())
        .or_else(|| normalize_optional(output_dir.map(str::to_string)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Drives one launch through its phases
pub struct Orchestrator {
    ctx: LaunchContext,
    scheduler: Arc<dyn SchedulerClient>,
    builder: CommandBuilder,
    poller: StatusPoller,
    streamer: LogStreamer,
    writer: MetadataWriter,
    options: LaunchOptions,
    tracker: RunTracker,
    handle: Option<JobHandle>,
}

impl Orchestrator {
    pub fn new(
        ctx: LaunchContext,
        scheduler: Arc<dyn SchedulerClient>,
        clock: Arc<dyn Clock>,
        writer: MetadataWriter,
        options: LaunchOptions,
    ) -> Self {
        let poller = StatusPoller::new(ctx.clone(), Arc::clone(&scheduler), clock)
            .with_interval(options.poll_interval);
        let streamer = LogStreamer::new(ctx.clone(), Arc::clone(&scheduler));
        Self {
            ctx,
            scheduler,
            builder: CommandBuilder::new(),
            poller,
            streamer,
            writer,
            options,
            tracker: RunTracker::new(),
            handle: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.tracker.phase()
    }

    /// Phases entered so far, in order
    pub fn phases(&self) -> Vec<RunPhase> {
        self.tracker.phases()
    }

    /// Handle of the submitted job, once there is one
    pub fn handle(&self) -> Option<&JobHandle> {
        self.handle.as_ref()
    }

    /// Launch `spec`, forwarding job logs to `sink`.
    ///
    /// Each call is a fresh launch with its own handle and phase history.
    pub fn run(&mut self, spec: &JobSpec, sink: &mut dyn Write) -> Result<RunReport, LaunchError> {
        let ctx = self.ctx.clone();
        let _guard = ctx.enter();

        self.tracker = RunTracker::new();
        self.handle = None;

        match self.execute(spec, sink) {
            Ok(report) => {
                info!(
                    full_name = %report.handle.full_name(),
                    "training job {} succeeded",
                    report.handle.full_name()
                );
                Ok(report)
            }
            Err(err) => {
                let failed_in = self.tracker.phase();
                self.tracker.fail();

                let kind = err.failure_kind();
                let full_name = self
                    .handle
                    .as_ref()
                    .map(|h| h.full_name().to_string())
                    .unwrap_or_else(|| spec.name.clone());
                error!(
                    full_name = %full_name,
                    phase = %failed_in,
                    failure_kind = ?kind,
                    error = %err,
                    "{}",
                    kind.description()
                );
                if matches!(err, LaunchError::Timeout(_)) {
                    warn!(full_name = %full_name, "job was not cancelled and may still be running");
                }
                Err(err)
            }
        }
    }

    fn advance(&mut self, next: RunPhase) -> Result<(), PhaseError> {
        self.tracker.transition(next)?;
        info!(phase = %next, "launch phase");
        Ok(())
    }

    fn execute(&mut self, spec: &JobSpec, sink: &mut dyn Write) -> Result<RunReport, LaunchError> {
        let handle = JobHandle::submitted_now(&spec.name, spec.job_type);
        let command = self.builder.build_for(spec, &handle)?;
        self.ctx.record_full_name(handle.full_name());
        self.handle = Some(handle.clone());

        self.advance(RunPhase::Submitting)?;
        info!(command = %command, "start training");
        let receipt = self.scheduler.submit(&command)?;
        info!(output = %receipt.output.trim(), "job submitted");

        self.advance(RunPhase::WaitingRunning)?;
        let ready_status = self
            .poller
            .wait(&handle, self.options.wait_mode, self.options.timeout)?;

        let tensorboard_url = if spec.enable_tensorboard {
            self.scheduler.tensorboard_url(&handle)
        } else {
            NOT_AVAILABLE.to_string()
        };

        self.advance(RunPhase::Streaming)?;
        let log_stats = match self.streamer.attach(&handle, sink) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(full_name = %handle.full_name(), error = %e, "could not follow job logs");
                None
            }
        };

        self.advance(RunPhase::CheckingTerminal)?;
        let final_status = self.scheduler.get_status(&handle);
        match final_status {
            JobStatus::Succeeded => {}
            JobStatus::Failed => {
                return Err(LaunchError::JobFailed {
                    full_name: handle.full_name().to_string(),
                })
            }
            status => {
                return Err(LaunchError::Indeterminate {
                    full_name: handle.full_name().to_string(),
                    status,
                })
            }
        }

        self.advance(RunPhase::WritingMetadata)?;
        let metadata = OutputMetadata {
            job_name: handle.full_name().to_string(),
            tensorboard_url,
            output_path: resolve_output_path(spec, self.options.output_dir.as_deref()),
        };
        self.writer.write(&metadata)?;

        self.advance(RunPhase::Done)?;
        Ok(RunReport {
            handle,
            submit_output: receipt.output,
            ready_status,
            final_status,
            metadata,
            log_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobType;

    fn make_spec() -> JobSpec {
        JobSpec::new("train", JobType::Standalone, "x", "python run.py")
    }

    #[test]
    fn test_resolve_output_path_precedence() {
        let spec = make_spec();
        assert_eq!(resolve_output_path(&spec, None), "N/A");
        assert_eq!(resolve_output_path(&spec, Some("/models")), "/models");
        assert_eq!(resolve_output_path(&spec, Some("None")), "N/A");

        let spec = make_spec().with_output_data_mount("out:/output");
        assert_eq!(resolve_output_path(&spec, Some("/models")), "out:/output");
    }

    #[test]
    fn test_failure_kinds() {
        let err = LaunchError::from(ValidationError::MissingCommand);
        assert_eq!(err.failure_kind(), FailureKind::Validation);

        let err = LaunchError::JobFailed {
            full_name: "train1".to_string(),
        };
        assert_eq!(err.failure_kind(), FailureKind::JobFailed);
        assert_eq!(err.to_string(), "training job train1 failed");

        let err = LaunchError::Indeterminate {
            full_name: "train1".to_string(),
            status: JobStatus::Running,
        };
        assert_eq!(err.failure_kind(), FailureKind::Indeterminate);
        assert_eq!(err.to_string(), "training job train1 ended with status RUNNING");
    }

    #[test]
    fn test_default_options() {
        let options = LaunchOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(1800));
        assert_eq!(options.poll_interval, Duration::from_secs(3));
        assert_eq!(options.wait_mode, WaitMode::Running);
    }
}
