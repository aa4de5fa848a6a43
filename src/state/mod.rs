//! Launch state machine
//!
//! A run moves through
//! `BUILDING → SUBMITTING → WAITING_RUNNING → STREAMING → CHECKING_TERMINAL
//! → WRITING_METADATA → DONE`, and can drop to `FAILED` from any
//! non-terminal phase.

mod run_phase;

pub use run_phase::{PhaseChange, PhaseError, RunPhase, RunTracker};

/// Check if a state is terminal (no further transitions possible)
pub trait TerminalState {
    fn is_terminal(&self) -> bool;
}
