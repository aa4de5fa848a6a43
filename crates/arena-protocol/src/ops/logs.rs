//! Logs operation.
//!
//! `logs -f <name>` follows a job's output until the job's pods go away.

use super::names;

/// Arguments that follow a job's log output.
pub fn follow_args(name: &str) -> Vec<String> {
    vec![names::LOGS.to_string(), "-f".to_string(), name.to_string()]
}
