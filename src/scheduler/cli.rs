//! Scheduler client backed by the scheduler's command-line tool.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

use arena_protocol::ops::{follow_args, status_args};
use arena_protocol::{parse_status_output, parse_tensorboard_url, JobStatus, NOT_AVAILABLE};
use tracing::{debug, info, warn, Span};

use super::{LogLines, SchedulerClient, SchedulerError, SubmitReceipt};
use crate::command::CommandLine;
use crate::context::LaunchContext;
use crate::job::JobHandle;

/// Output of a finished scheduler call
#[derive(Debug)]
struct Captured {
    exit_code: Option<i32>,
    /// stdout followed by stderr
    output: String,
}

impl Captured {
    fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs scheduler operations as blocking child processes
pub struct CliScheduler {
    ctx: LaunchContext,
    program: String,
}

impl CliScheduler {
    pub fn new(ctx: LaunchContext, program: impl Into<String>) -> Self {
        Self {
            ctx,
            program: program.into(),
        }
    }

    /// Full shell line for a submit call
    fn submit_line(&self, command: &CommandLine) -> String {
        format!("{} {}", self.program, command.render())
    }

    fn capture(&self, command: &mut Command, program: &str) -> Result<Captured, SchedulerError> {
        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SchedulerError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(Captured {
            exit_code: output.status.code(),
            output: text,
        })
    }

    /// Run `get <name> --type <type>`; `None` when the query failed.
    fn describe(&self, handle: &JobHandle) -> Option<String> {
        let args = status_args(handle.full_name(), handle.job_type());
        match self.capture(Command::new(&self.program).args(&args), &self.program) {
            Ok(captured) if captured.success() => Some(captured.output),
            Ok(captured) => {
                warn!(
                    exit_code = ?captured.exit_code,
                    output = %captured.output.trim(),
                    "scheduler query failed"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "scheduler query could not run");
                None
            }
        }
    }
}

impl SchedulerClient for CliScheduler {
    fn submit(&self, command: &CommandLine) -> Result<SubmitReceipt, SchedulerError> {
        let _guard = self.ctx.enter();
        let line = self.submit_line(command);
        info!(command = %line, "running submit");

        // The workload command is a single double-quoted token; the shell
        // strips that one layer of quoting.
        let captured = self.capture(Command::new("sh").arg("-c").arg(&line), "sh")?;
        if !captured.success() {
            return Err(SchedulerError::Submit {
                exit_code: captured.exit_code.unwrap_or(-1),
                output: captured.output,
            });
        }

        Ok(SubmitReceipt {
            output: captured.output,
        })
    }

    fn get_status(&self, handle: &JobHandle) -> JobStatus {
        let _guard = self.ctx.enter();
        match self.describe(handle) {
            Some(output) => parse_status_output(&output),
            None => JobStatus::Unknown,
        }
    }

    fn stream_logs(&self, handle: &JobHandle) -> Result<LogLines, SchedulerError> {
        let _guard = self.ctx.enter();
        let mut child = Command::new(&self.program)
            .args(follow_args(handle.full_name()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SchedulerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SchedulerError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "log process has no stdout",
            ))
        })?;

        debug!(pid = child.id(), "following job logs");
        Ok(Box::new(FollowedLogs {
            child,
            reader: BufReader::new(stdout),
            span: self.ctx.span().clone(),
            finished: false,
        }))
    }

    fn tensorboard_url(&self, handle: &JobHandle) -> String {
        let _guard = self.ctx.enter();
        self.describe(handle)
            .and_then(|output| parse_tensorboard_url(&output))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

/// Lines read from a `logs -f` child until it exits
struct FollowedLogs {
    child: Child,
    reader: BufReader<ChildStdout>,
    span: Span,
    finished: bool,
}

impl FollowedLogs {
    fn finish(&mut self) {
        self.finished = true;
        match self.child.wait() {
            Ok(status) => info!(parent: &self.span, exit_code = ?status.code(), "log stream closed"),
            Err(e) => warn!(parent: &self.span, error = %e, "failed to reap log process"),
        }
    }
}

impl Iterator for FollowedLogs {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                self.finish();
                None
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                Some(line.trim_end_matches(['\r', '\n']).to_string())
            }
            Err(e) => {
                warn!(parent: &self.span, error = %e, "log stream read failed");
                self.finish();
                None
            }
        }
    }
}

impl Drop for FollowedLogs {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
