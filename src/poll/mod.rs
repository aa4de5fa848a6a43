//! Status polling
//!
//! Blocks the calling thread until a submitted job reaches the condition a
//! wait mode asks for:
//! - `WaitMode::Running`: the job has left `PENDING`
//! - `WaitMode::Terminal`: the job is `SUCCEEDED` or `FAILED`
//!
//! The scheduler is queried once up front and then every `interval`. The
//! deadline is checked before each sleep, so at most one query happens
//! after it has passed. An `UNKNOWN` status never ends a wait; it is logged
//! every time it is seen so flaky scheduler queries stay visible.

mod clock;

pub use clock::{Clock, SystemClock};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arena_protocol::{JobStatus, JobType};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::LaunchContext;
use crate::job::JobHandle;
use crate::scheduler::SchedulerClient;

/// Delay between two status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Condition a wait blocks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    /// Until the job leaves `PENDING`
    #[default]
    Running,
    /// Until the job is `SUCCEEDED` or `FAILED`
    Terminal,
}

impl WaitMode {
    /// Whether a wait in this mode goes on after observing `status`
    pub fn keeps_waiting(&self, status: JobStatus) -> bool {
        match self {
            WaitMode::Running => matches!(status, JobStatus::Pending | JobStatus::Unknown),
            WaitMode::Terminal => !status.is_terminal(),
        }
    }
}

impl fmt::Display for WaitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitMode::Running => write!(f, "start running"),
            WaitMode::Terminal => write!(f, "finish"),
        }
    }
}

/// The job did not reach the awaited condition in time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {elapsed:?} waiting for job {full_name} ({job_type}) to {mode}; last status {last_status}")]
pub struct TimeoutError {
    pub full_name: String,
    pub job_type: JobType,
    pub mode: WaitMode,
    pub elapsed: Duration,
    pub last_status: JobStatus,
}

/// Polls the scheduler until a wait condition holds or time runs out
pub struct StatusPoller {
    ctx: LaunchContext,
    scheduler: Arc<dyn SchedulerClient>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(ctx: LaunchContext, scheduler: Arc<dyn SchedulerClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            ctx,
            scheduler,
            clock,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the job has left `PENDING`
    pub fn wait_until_running(&self, handle: &JobHandle, timeout: Duration) -> Result<JobStatus, TimeoutError> {
        self.wait(handle, WaitMode::Running, timeout)
    }

    /// Block until the job is terminal
    pub fn wait_until_terminal(&self, handle: &JobHandle, timeout: Duration) -> Result<JobStatus, TimeoutError> {
        self.wait(handle, WaitMode::Terminal, timeout)
    }

    /// Block until `mode` is satisfied; returns the status that satisfied it
    pub fn wait(&self, handle: &JobHandle, mode: WaitMode, timeout: Duration) -> Result<JobStatus, TimeoutError> {
        let _guard = self.ctx.enter();
        let started = self.clock.now();
        let mut status = self.query(handle, None);

        while mode.keeps_waiting(status) {
            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= timeout {
                let err = TimeoutError {
                    full_name: handle.full_name().to_string(),
                    job_type: handle.job_type(),
                    mode,
                    elapsed,
                    last_status: status,
                };
                warn!(full_name = %handle.full_name(), "{}", err);
                return Err(err);
            }
            self.clock.sleep(self.interval);
            status = self.query(handle, Some(status));
        }

        info!(
            full_name = %handle.full_name(),
            job_type = %handle.job_type(),
            status = %status,
            "job is ready"
        );
        Ok(status)
    }

    fn query(&self, handle: &JobHandle, previous: Option<JobStatus>) -> JobStatus {
        let status = self.scheduler.get_status(handle);
        if status == JobStatus::Unknown {
            warn!(full_name = %handle.full_name(), "job status unknown, still waiting");
        } else if previous != Some(status) {
            info!(full_name = %handle.full_name(), status = %status, "job status");
        }
        status
    }
}
