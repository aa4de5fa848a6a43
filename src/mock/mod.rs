//! Test doubles
//!
//! In-process stand-ins for the scheduler and the clock, so the poll loop
//! and the orchestrator can be exercised without spawning processes or
//! waiting on real time.
//!
//! - `MockScheduler`: scripted status sequence, log lines and tensorboard
//!   URL, with failure injection and a record of every call
//! - `ManualClock`: virtual time that only moves when slept on

mod clock;
mod failure;
mod scheduler;

pub use clock::ManualClock;
pub use failure::{FailureConfig, FailureInjector, MockOperation};
pub use scheduler::{MockScheduler, SchedulerCall};
