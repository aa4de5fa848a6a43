//! Run outputs and failure taxonomy
//!
//! Implements the artifacts a run leaves for the next pipeline step and the
//! stable exit codes of the launcher.

mod failure;
mod metadata;

pub use failure::{ExitCode, FailureKind};
pub use metadata::{
    MetadataError, MetadataRecord, MetadataWriter, OutputEntry, OutputMetadata, DEFAULT_METADATA_PATH,
    DEFAULT_OUTPUT_FILE,
};
