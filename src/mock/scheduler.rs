//! Scripted scheduler.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arena_protocol::{JobStatus, NOT_AVAILABLE};

use super::failure::{FailureConfig, FailureInjector, MockOperation};
use crate::command::CommandLine;
use crate::job::JobHandle;
use crate::scheduler::{LogLines, SchedulerClient, SchedulerError, SubmitReceipt};

/// A call the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    /// Rendered command line
    Submit(String),
    /// Full job name
    GetStatus(String),
    StreamLogs(String),
    TensorboardUrl(String),
}

#[derive(Debug)]
struct MockState {
    /// Status script; the last entry repeats forever
    statuses: VecDeque<JobStatus>,
    log_lines: Vec<String>,
    tensorboard_url: Option<String>,
    submit_output: String,
    calls: Vec<SchedulerCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            statuses: VecDeque::new(),
            log_lines: Vec::new(),
            tensorboard_url: None,
            submit_output: "job submitted\n".to_string(),
            calls: Vec::new(),
        }
    }
}

/// Configurable in-process scheduler for tests
///
/// Clones share state, so a test can keep one clone for inspection while
/// the code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockScheduler {
    state: Arc<Mutex<MockState>>,
    failures: Arc<Mutex<FailureInjector>>,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failure(&self, op: MockOperation) -> Option<FailureConfig> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check(op)
    }

    /// Statuses returned by successive queries; the last one sticks.
    /// With no script every query answers `UNKNOWN`.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        self.state().statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_log_lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state().log_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tensorboard_url(self, url: impl Into<String>) -> Self {
        self.state().tensorboard_url = Some(url.into());
        self
    }

    pub fn with_submit_output(self, output: impl Into<String>) -> Self {
        self.state().submit_output = output.into();
        self
    }

    /// Make every submit exit with `exit_code`
    pub fn fail_submit(self, exit_code: i32, output: impl Into<String>) -> Self {
        self.inject_failure(MockOperation::Submit, FailureConfig::exit(exit_code, output))
    }

    pub fn inject_failure(self, op: MockOperation, config: FailureConfig) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(op, config);
        self
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.state().calls.clone()
    }

    pub fn submitted_commands(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                SchedulerCall::Submit(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn status_query_count(&self) -> usize {
        self.count(|call| matches!(call, SchedulerCall::GetStatus(_)))
    }

    pub fn log_stream_count(&self) -> usize {
        self.count(|call| matches!(call, SchedulerCall::StreamLogs(_)))
    }

    pub fn tensorboard_query_count(&self) -> usize {
        self.count(|call| matches!(call, SchedulerCall::TensorboardUrl(_)))
    }

    fn count(&self, pred: impl Fn(&SchedulerCall) -> bool) -> usize {
        self.state().calls.iter().filter(|call| pred(*call)).count()
    }

    fn record(&self, call: SchedulerCall) {
        self.state().calls.push(call);
    }
}

impl SchedulerClient for MockScheduler {
    fn submit(&self, command: &CommandLine) -> Result<SubmitReceipt, SchedulerError> {
        self.record(SchedulerCall::Submit(command.render()));
        if let Some(failure) = self.failure(MockOperation::Submit) {
            return Err(SchedulerError::Submit {
                exit_code: failure.exit_code,
                output: failure.output,
            });
        }
        Ok(SubmitReceipt {
            output: self.state().submit_output.clone(),
        })
    }

    fn get_status(&self, handle: &JobHandle) -> JobStatus {
        self.record(SchedulerCall::GetStatus(handle.full_name().to_string()));
        if self.failure(MockOperation::GetStatus).is_some() {
            return JobStatus::Unknown;
        }
        let mut state = self.state();
        if state.statuses.len() > 1 {
            state.statuses.pop_front().unwrap_or(JobStatus::Unknown)
        } else {
            state.statuses.front().copied().unwrap_or(JobStatus::Unknown)
        }
    }

    fn stream_logs(&self, handle: &JobHandle) -> Result<LogLines, SchedulerError> {
        self.record(SchedulerCall::StreamLogs(handle.full_name().to_string()));
        if let Some(failure) = self.failure(MockOperation::StreamLogs) {
            return Err(SchedulerError::Spawn {
                program: "mock-scheduler".to_string(),
                source: io::Error::new(io::ErrorKind::Other, failure.output),
            });
        }
        let lines = self.state().log_lines.clone();
        Ok(Box::new(lines.into_iter()))
    }

    fn tensorboard_url(&self, handle: &JobHandle) -> String {
        self.record(SchedulerCall::TensorboardUrl(handle.full_name().to_string()));
        if self.failure(MockOperation::TensorboardUrl).is_some() {
            return NOT_AVAILABLE.to_string();
        }
        self.state()
            .tensorboard_url
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobType;

    fn make_handle() -> JobHandle {
        JobHandle::submitted_now("train", JobType::Standalone)
    }

    #[test]
    fn test_status_script_last_entry_sticks() {
        let mock = MockScheduler::new().with_statuses([JobStatus::Pending, JobStatus::Running]);
        let handle = make_handle();
        assert_eq!(mock.get_status(&handle), JobStatus::Pending);
        assert_eq!(mock.get_status(&handle), JobStatus::Running);
        assert_eq!(mock.get_status(&handle), JobStatus::Running);
        assert_eq!(mock.status_query_count(), 3);
    }

    #[test]
    fn test_empty_script_is_unknown() {
        let mock = MockScheduler::new();
        assert_eq!(mock.get_status(&make_handle()), JobStatus::Unknown);
    }

    #[test]
    fn test_injected_status_failure_is_unknown() {
        let mock = MockScheduler::new()
            .with_statuses([JobStatus::Running])
            .inject_failure(
                MockOperation::GetStatus,
                FailureConfig::exit(1, "timeout").with_fail_count(1),
            );
        let handle = make_handle();
        assert_eq!(mock.get_status(&handle), JobStatus::Unknown);
        assert_eq!(mock.get_status(&handle), JobStatus::Running);
    }

    #[test]
    fn test_clones_share_calls() {
        let mock = MockScheduler::new().with_log_lines(["a", "b"]);
        let other = mock.clone();
        let lines: Vec<String> = other.stream_logs(&make_handle()).unwrap().collect();
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(mock.log_stream_count(), 1);
    }

    #[test]
    fn test_tensorboard_default_is_not_available() {
        let mock = MockScheduler::new();
        assert_eq!(mock.tensorboard_url(&make_handle()), NOT_AVAILABLE);
    }
}
