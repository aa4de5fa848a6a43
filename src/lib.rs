//! Arena launcher
//!
//! Submits a single training job to the cluster scheduler CLI, waits for it
//! to start, follows its logs, checks how it ended and records its outputs
//! for the next pipeline step.

pub mod cli;
pub mod command;
pub mod config;
pub mod context;
pub mod job;
pub mod mock;
pub mod poll;
pub mod run;
pub mod scheduler;
pub mod state;
pub mod summary;

pub use command::{CommandBuilder, CommandLine};
pub use config::{ConfigError, LauncherConfig};
pub use context::LaunchContext;
pub use job::{DataMounts, JobHandle, JobSpec, JobType, ValidationError};
pub use poll::{Clock, StatusPoller, SystemClock, TimeoutError, WaitMode};
pub use run::{LaunchError, LaunchOptions, LogStreamer, Orchestrator, RunReport};
pub use scheduler::{CliScheduler, SchedulerClient, SchedulerError};
pub use state::{RunPhase, RunTracker};
pub use summary::{ExitCode, FailureKind, MetadataError, MetadataWriter, OutputMetadata};

pub use arena_protocol::JobStatus;
