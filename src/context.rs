//! Per-run logging context
//!
//! One `LaunchContext` is created per launcher invocation and handed to
//! every component's constructor. It owns the `launch` span that tags all
//! log records of the run with the run id, the job's base name and, once
//! the job has been submitted, its full scheduler name.

use tracing::{field, info_span, span::Entered, Span};

use crate::job::generate_run_id;

#[derive(Debug, Clone)]
pub struct LaunchContext {
    run_id: String,
    job_name: String,
    span: Span,
}

impl LaunchContext {
    pub fn new(job_name: impl Into<String>) -> Self {
        let run_id = generate_run_id();
        let job_name = job_name.into();
        let span = info_span!(
            "launch",
            run_id = %run_id,
            job = %job_name,
            full_name = field::Empty,
        );
        Self {
            run_id,
            job_name,
            span,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Base job name the run was started for
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Enter the run's span for the lifetime of the guard
    pub fn enter(&self) -> Entered<'_> {
        self.span.enter()
    }

    /// Attach the submitted job name to every later record of the run
    pub fn record_full_name(&self, full_name: &str) {
        self.span.record("full_name", full_name);
    }
}
