//! Failure injection for the mock scheduler.

use std::collections::HashMap;

/// Scheduler operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Submit,
    StreamLogs,
    GetStatus,
    TensorboardUrl,
}

/// How an injected failure looks
#[derive(Debug, Clone)]
pub struct FailureConfig {
    /// Process exit code to report
    pub exit_code: i32,
    /// Captured output to report
    pub output: String,
    /// Number of calls to fail before succeeding (None = always fail)
    pub fail_count: Option<u32>,
}

impl FailureConfig {
    /// A failing call with the given exit code and output
    pub fn exit(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
            fail_count: None,
        }
    }

    /// Set the number of times to fail before succeeding
    pub fn with_fail_count(mut self, count: u32) -> Self {
        self.fail_count = Some(count);
        self
    }
}

/// Per-operation failure bookkeeping
#[derive(Debug, Default)]
pub struct FailureInjector {
    configs: HashMap<MockOperation, FailureConfig>,
    call_counts: HashMap<MockOperation, u32>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, op: MockOperation, config: FailureConfig) {
        self.configs.insert(op, config);
    }

    pub fn clear(&mut self, op: MockOperation) {
        self.configs.remove(&op);
        self.call_counts.remove(&op);
    }

    /// Record a call to `op`; returns the failure to report, if any
    pub fn check(&mut self, op: MockOperation) -> Option<FailureConfig> {
        let config = self.configs.get(&op)?.clone();
        let count = self.call_counts.entry(op).or_insert(0);
        *count += 1;

        match config.fail_count {
            Some(limit) if *count > limit => None,
            _ => Some(config),
        }
    }
}
