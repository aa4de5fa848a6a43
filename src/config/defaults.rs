//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::poll::WaitMode;
use crate::summary::{DEFAULT_METADATA_PATH, DEFAULT_OUTPUT_FILE};

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherDefaults {
    /// Scheduler CLI binary (default: "arena")
    pub scheduler_bin: String,

    /// Delay between status queries (default: 3)
    pub poll_interval_seconds: u64,

    /// Bound on waiting for the job (default: 30)
    pub timeout_minutes: u64,

    pub metadata_path: String,

    pub output_file: String,

    /// What the wait phase waits for (default: running)
    pub wait_mode: WaitMode,
}

impl Default for LauncherDefaults {
    fn default() -> Self {
        Self {
            scheduler_bin: arena_protocol::DEFAULT_SCHEDULER_BIN.to_string(),
            poll_interval_seconds: 3,
            timeout_minutes: 30,
            metadata_path: DEFAULT_METADATA_PATH.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            wait_mode: WaitMode::Running,
        }
    }
}

impl LauncherDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "scheduler_bin": self.scheduler_bin,
            "poll_interval_seconds": self.poll_interval_seconds,
            "timeout_minutes": self.timeout_minutes,
            "metadata_path": self.metadata_path,
            "output_file": self.output_file,
            "wait_mode": self.wait_mode,
        })
    }
}
