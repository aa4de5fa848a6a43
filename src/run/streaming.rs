//! Log streaming
//!
//! Attaches to a job's log output once and forwards every line to a sink
//! as it arrives, flushing after each line so operators see progress of a
//! long-running job live. The stream ends when the scheduler's log process
//! exits; there is no reconnect.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::{debug, info};

use crate::context::LaunchContext;
use crate::job::JobHandle;
use crate::scheduler::{SchedulerClient, SchedulerError};

/// Error during log streaming
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The log process could not be started
    #[error("failed to attach to job logs: {0}")]
    Attach(#[from] SchedulerError),

    /// Forwarding to the sink failed
    #[error("failed to forward job logs: {0}")]
    Sink(#[from] io::Error),
}

/// Totals for one attach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub lines: u64,
    pub bytes: u64,
}

/// Forwards a job's log lines to a writer
pub struct LogStreamer {
    ctx: LaunchContext,
    scheduler: Arc<dyn SchedulerClient>,
}

impl LogStreamer {
    pub fn new(ctx: LaunchContext, scheduler: Arc<dyn SchedulerClient>) -> Self {
        Self { ctx, scheduler }
    }

    /// Follow the job's logs until the log process exits
    pub fn attach(&self, handle: &JobHandle, sink: &mut dyn Write) -> Result<StreamStats, StreamError> {
        let _guard = self.ctx.enter();
        debug!(full_name = %handle.full_name(), "attaching to job logs");

        let mut stats = StreamStats::default();
        for line in self.scheduler.stream_logs(handle)? {
            writeln!(sink, "{}", line)?;
            sink.flush()?;
            stats.lines += 1;
            stats.bytes += line.len() as u64;
        }

        info!(
            full_name = %handle.full_name(),
            lines = stats.lines,
            "job log stream ended"
        );
        Ok(stats)
    }
}
