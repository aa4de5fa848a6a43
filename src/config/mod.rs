//! Launcher configuration
//!
//! Three layers, merged in order:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. CLI flags

mod defaults;
mod launcher;
mod merge;

pub use defaults::LauncherDefaults;
pub use launcher::{ConfigError, LauncherConfig};
pub use merge::{deep_merge, merge_layers};
