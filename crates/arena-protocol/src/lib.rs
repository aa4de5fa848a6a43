//! Arena scheduler CLI protocol
//!
//! The launcher only ever talks to the cluster scheduler through its
//! command-line tool. This crate pins down that surface: the job type
//! tokens, the verbs and argument shapes of each operation, and how the
//! tool's human-oriented text output is scraped back into typed values.

pub mod job_type;
pub mod ops;

pub use job_type::JobType;
pub use ops::{parse_status_output, parse_tensorboard_url, JobStatus};

/// Scheduler executable used when none is configured.
pub const DEFAULT_SCHEDULER_BIN: &str = "arena";

/// Tensorboard image the scheduler uses when `--tensorboardImage` is omitted.
pub const DEFAULT_TENSORBOARD_IMAGE: &str = "tensorflow/tensorflow:1.12.0";

/// Placeholder for values that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";
