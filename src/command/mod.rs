//! Scheduler command rendering
//!
//! Turns a `JobSpec` into the argument string of a `submit` call. Flag order
//! is fixed so the same spec always renders byte-identical output:
//!
//! 1. `submit <type> --name=<name>`
//! 2. `--workers=<n>` (MPI only)
//! 3. `--image=<image>`
//! 4. `--gpus`, `--cpu`, `--memory` (when > 0), `--tensorboardImage` (when not
//!    the default), `--tensorboard`, `--rdma` (MPI only), `--logdir` (when the
//!    directory exists locally)
//! 5. one `--data=<mount>` per deduplicated mount
//! 6. the workload command as a single double-quoted token

use std::fmt;

use arena_protocol::ops::SUBMIT_VERB;
use arena_protocol::DEFAULT_TENSORBOARD_IMAGE;
use tracing::debug;

use crate::job::{JobHandle, JobSpec, ValidationError};

/// A rendered submit command, without the scheduler executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// All tokens; the last one is the quoted workload command
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Value of the `--name=` token
    pub fn job_name(&self) -> Option<&str> {
        self.tokens.iter().find_map(|t| t.strip_prefix("--name="))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Space-joined form, as handed to the shell
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Renders job specs into submit commands
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder;

impl CommandBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render using the spec's own name
    pub fn build(&self, spec: &JobSpec) -> Result<CommandLine, ValidationError> {
        self.render(spec, &spec.name)
    }

    /// Render for a submission, naming the job by the handle's full name
    pub fn build_for(&self, spec: &JobSpec, handle: &JobHandle) -> Result<CommandLine, ValidationError> {
        self.render(spec, handle.full_name())
    }

    fn render(&self, spec: &JobSpec, name: &str) -> Result<CommandLine, ValidationError> {
        spec.validate()?;

        let distributed = spec.job_type.is_distributed();
        let mut tokens = vec![
            SUBMIT_VERB.to_string(),
            spec.job_type.token().to_string(),
            format!("--name={}", name),
        ];

        if distributed {
            tokens.push(format!("--workers={}", spec.workers));
        }

        tokens.push(format!("--image={}", spec.image));

        if spec.gpus > 0 {
            tokens.push(format!("--gpus={}", spec.gpus));
        }
        if spec.cpu > 0 {
            tokens.push(format!("--cpu={}", spec.cpu));
        }
        if spec.memory > 0 {
            tokens.push(format!("--memory={}", spec.memory));
        }
        if spec.tensorboard_image != DEFAULT_TENSORBOARD_IMAGE {
            tokens.push(format!("--tensorboardImage={}", spec.tensorboard_image));
        }
        if spec.enable_tensorboard {
            tokens.push("--tensorboard".to_string());
        }
        if distributed && spec.rdma {
            tokens.push("--rdma".to_string());
        }
        if let Some(ref dir) = spec.log_directory {
            if dir.exists() {
                tokens.push(format!("--logdir={}", dir.display()));
            } else {
                debug!(log_dir = %dir.display(), "skipping missing log dir");
            }
        }

        for mount in spec.effective_mounts().iter() {
            tokens.push(format!("--data={}", mount));
        }

        tokens.push(format!("\"{}\"", spec.command));

        Ok(CommandLine { tokens })
    }
}
