//! Submit operation.
//!
//! `submit <type> --name=<name> [flags...] "<command>"`. The flag set is
//! rendered by the launcher; the scheduler answers with free-form text that
//! is only ever logged.

use super::names;

/// Verb that opens every submit command line.
pub const SUBMIT_VERB: &str = names::SUBMIT;
