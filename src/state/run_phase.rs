//! Run phases and transition bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::TerminalState;

/// Phase of a launcher run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// Validating the spec and rendering the command
    Building,
    /// Handing the command to the scheduler
    Submitting,
    /// Polling until the job runs (or finishes, in terminal wait mode)
    WaitingRunning,
    /// Forwarding job logs
    Streaming,
    /// Final status query
    CheckingTerminal,
    /// Persisting output metadata
    WritingMetadata,
    Done,
    Failed,
}

impl TerminalState for RunPhase {
    fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }
}

impl RunPhase {
    /// Check if transition from this phase to target is valid
    pub fn can_transition_to(&self, target: RunPhase) -> bool {
        match (self, target) {
            (RunPhase::Building, RunPhase::Submitting) => true,
            (RunPhase::Submitting, RunPhase::WaitingRunning) => true,
            (RunPhase::WaitingRunning, RunPhase::Streaming) => true,
            (RunPhase::Streaming, RunPhase::CheckingTerminal) => true,
            (RunPhase::CheckingTerminal, RunPhase::WritingMetadata) => true,
            (RunPhase::WritingMetadata, RunPhase::Done) => true,

            // Any live phase can fail
            (from, RunPhase::Failed) => !from.is_terminal(),

            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Building => "BUILDING",
            RunPhase::Submitting => "SUBMITTING",
            RunPhase::WaitingRunning => "WAITING_RUNNING",
            RunPhase::Streaming => "STREAMING",
            RunPhase::CheckingTerminal => "CHECKING_TERMINAL",
            RunPhase::WritingMetadata => "WRITING_METADATA",
            RunPhase::Done => "DONE",
            RunPhase::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Errors for phase transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition { from: RunPhase, to: RunPhase },
}

/// A recorded phase entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseChange {
    pub phase: RunPhase,
    pub at: DateTime<Utc>,
}

/// Current phase plus the history of every phase entered
#[derive(Debug, Clone)]
pub struct RunTracker {
    history: Vec<PhaseChange>,
}

impl RunTracker {
    /// Start a run in BUILDING
    pub fn new() -> Self {
        Self {
            history: vec![PhaseChange {
                phase: RunPhase::Building,
                at: Utc::now(),
            }],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.history
            .last()
            .map(|change| change.phase)
            .unwrap_or(RunPhase::Building)
    }

    /// Phases entered so far, in order
    pub fn phases(&self) -> Vec<RunPhase> {
        self.history.iter().map(|change| change.phase).collect()
    }

    pub fn history(&self) -> &[PhaseChange] {
        &self.history
    }

    pub fn transition(&mut self, next: RunPhase) -> Result<(), PhaseError> {
        let current = self.phase();
        if !current.can_transition_to(next) {
            return Err(PhaseError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.history.push(PhaseChange {
            phase: next,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Move to FAILED unless the run already ended
    pub fn fail(&mut self) {
        if !self.phase().is_terminal() {
            self.history.push(PhaseChange {
                phase: RunPhase::Failed,
                at: Utc::now(),
            });
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
