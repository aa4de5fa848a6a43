//! Output metadata for the next pipeline step
//!
//! Two artifacts are written once a job has succeeded:
//! - a JSON record `{"outputs":[{"jobname","tensorboard","output"}]}` the
//!   pipeline UI renders
//! - a plain file holding only the output path, consumed as a step output
//!
//! Both replace whatever is already at their path.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::context::LaunchContext;

/// Default location of the metadata record
pub const DEFAULT_METADATA_PATH: &str = "/mlpipeline-ui-metadata.json";

/// Default location of the output path artifact
pub const DEFAULT_OUTPUT_FILE: &str = "/output.txt";

/// What a finished run reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMetadata {
    /// Full scheduler name of the job
    pub job_name: String,
    /// Tensorboard endpoint or `"N/A"`
    pub tensorboard_url: String,
    /// Where the job put its output, or `"N/A"`
    pub output_path: String,
}

impl OutputMetadata {
    pub fn record(&self) -> MetadataRecord {
        MetadataRecord {
            outputs: vec![OutputEntry {
                jobname: self.job_name.clone(),
                tensorboard: self.tensorboard_url.clone(),
                output: self.output_path.clone(),
            }],
        }
    }
}

/// On-disk metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub outputs: Vec<OutputEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    pub jobname: String,
    pub tensorboard: String,
    pub output: String,
}

impl MetadataRecord {
    /// Load a record from file
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        let json = fs::read_to_string(path).map_err(|source| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Errors writing output metadata
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the metadata record and the output path artifact
pub struct MetadataWriter {
    ctx: LaunchContext,
    metadata_path: PathBuf,
    output_file: PathBuf,
}

impl MetadataWriter {
    pub fn new(ctx: LaunchContext, metadata_path: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            metadata_path: metadata_path.into(),
            output_file: output_file.into(),
        }
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Write both artifacts, overwriting existing files
    pub fn write(&self, metadata: &OutputMetadata) -> Result<(), MetadataError> {
        let _guard = self.ctx.enter();

        // Stage both files before renaming either; the metadata record lands last.
        let json = serde_json::to_string(&metadata.record())?;
        let metadata_temp = stage(&self.metadata_path, json.as_bytes())?;
        let output_temp = match stage(&self.output_file, metadata.output_path.as_bytes()) {
            Ok(temp) => temp,
            Err(e) => {
                let _ = fs::remove_file(&metadata_temp);
                return Err(e);
            }
        };
        commit(&output_temp, &self.output_file)?;
        commit(&metadata_temp, &self.metadata_path)?;

        info!(
            metadata_path = %self.metadata_path.display(),
            output_file = %self.output_file.display(),
            job_name = %metadata.job_name,
            "wrote output metadata"
        );
        Ok(())
    }
}

fn io_error(path: &Path) -> impl Fn(io::Error) -> MetadataError + '_ {
    move |source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `contents` next to `path` as `<name>.tmp`, creating the parent
/// directory if needed. Returns the temp path.
fn stage(path: &Path, contents: &[u8]) -> Result<PathBuf, MetadataError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_error(path))?;
        }
    }

    let mut temp_name = path.file_name().map(OsString::from).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, contents).map_err(io_error(path))?;
    Ok(temp_path)
}

fn commit(temp_path: &Path, path: &Path) -> Result<(), MetadataError> {
    fs::rename(temp_path, path).map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_metadata() -> OutputMetadata {
        OutputMetadata {
            job_name: "train20240101000000".to_string(),
            tensorboard_url: "N/A".to_string(),
            output_path: "out:/output".to_string(),
        }
    }

    #[test]
    fn test_record_shape() {
        let json = serde_json::to_value(make_metadata().record()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "outputs": [{
                    "jobname": "train20240101000000",
                    "tensorboard": "N/A",
                    "output": "out:/output"
                }]
            })
        );
    }

    #[test]
    fn test_write_both_artifacts() {
        let dir = TempDir::new().unwrap();
        let writer = MetadataWriter::new(
            LaunchContext::new("train"),
            dir.path().join("ui/metadata.json"),
            dir.path().join("output.txt"),
        );
        writer.write(&make_metadata()).unwrap();

        let record = MetadataRecord::from_file(writer.metadata_path()).unwrap();
        assert_eq!(record.outputs[0].jobname, "train20240101000000");
        assert_eq!(fs::read_to_string(writer.output_file()).unwrap(), "out:/output");
        assert!(!dir.path().join("output.txt.tmp").exists());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let metadata_path = dir.path().join("metadata.json");
        let output_file = dir.path().join("output.txt");
        fs::write(&metadata_path, "stale").unwrap();
        fs::write(&output_file, "stale output that is longer").unwrap();

        let writer = MetadataWriter::new(LaunchContext::new("train"), &metadata_path, &output_file);
        writer.write(&make_metadata()).unwrap();

        assert!(MetadataRecord::from_file(&metadata_path).is_ok());
        assert_eq!(fs::read_to_string(&output_file).unwrap(), "out:/output");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let writer = MetadataWriter::new(
            LaunchContext::new("train"),
            blocker.join("metadata.json"),
            dir.path().join("output.txt"),
        );
        let err = writer.write(&make_metadata()).unwrap_err();
        assert!(matches!(err, MetadataError::Io { .. }));
    }

    #[test]
    fn test_output_failure_leaves_no_metadata() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let metadata_path = dir.path().join("metadata.json");

        let writer = MetadataWriter::new(
            LaunchContext::new("train"),
            &metadata_path,
            blocker.join("output.txt"),
        );
        let err = writer.write(&make_metadata()).unwrap_err();

        assert!(matches!(err, MetadataError::Io { .. }));
        assert!(!metadata_path.exists());
        assert!(!dir.path().join("metadata.json.tmp").exists());
    }
}
