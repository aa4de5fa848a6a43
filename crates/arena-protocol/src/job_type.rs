//! Job type tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of training job the scheduler should create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    /// Single-process job, submitted as `tfjob`.
    #[serde(rename = "tfjob")]
    Standalone,
    /// MPI job spread over several workers, submitted as `mpijob`.
    #[serde(rename = "mpijob")]
    DistributedMpi,
}

impl JobType {
    /// Token used both for `submit <type>` and `get --type <type>`.
    pub fn token(&self) -> &'static str {
        match self {
            JobType::Standalone => "tfjob",
            JobType::DistributedMpi => "mpijob",
        }
    }

    /// Whether worker count and RDMA apply to this job type.
    pub fn is_distributed(&self) -> bool {
        matches!(self, JobType::DistributedMpi)
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(JobType::Standalone.token(), "tfjob");
        assert_eq!(JobType::DistributedMpi.token(), "mpijob");
        assert_eq!(JobType::DistributedMpi.to_string(), "mpijob");
    }

    #[test]
    fn test_serde_uses_tokens() {
        let json = serde_json::to_string(&JobType::DistributedMpi).unwrap();
        assert_eq!(json, "\"mpijob\"");
        let parsed: JobType = serde_json::from_str("\"tfjob\"").unwrap();
        assert_eq!(parsed, JobType::Standalone);
    }
}
