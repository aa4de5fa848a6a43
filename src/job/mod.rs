//! Job specification and handle
//!
//! `JobSpec` is the validated description of what to launch. It is built
//! once from launcher flags (or directly by library callers) and never
//! mutated afterwards. `JobHandle` is created when the job is submitted and
//! is the only key used to query the scheduler from then on.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use arena_protocol::JobType;
use arena_protocol::DEFAULT_TENSORBOARD_IMAGE;

/// Literal pipeline steps pass for an unset optional argument.
pub const UNSET_SENTINEL: &str = "None";

/// Timestamp suffix appended to the base name at submission.
pub const FULL_NAME_SUFFIX_FORMAT: &str = "%Y%m%d%H%M%S";

/// Job specification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing job name")]
    MissingName,

    #[error("missing command")]
    MissingCommand,

    #[error("invalid workers: {0} (must be at least 1)")]
    InvalidWorkers(u32),

    #[error("invalid data mount: {0:?} (expected source:target)")]
    InvalidDataMount(String),
}

/// True for values pipeline steps use to mean "not set".
pub fn is_unset(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == UNSET_SENTINEL
}

/// Drop unset values (`None` sentinel or blank).
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_unset(v))
}

/// Check that a mount entry has the `source:target` shape.
pub fn validate_mount(entry: &str) -> Result<(), ValidationError> {
    let well_formed = match entry.split_once(':') {
        Some((source, target)) => {
            !source.is_empty() && !target.is_empty() && !entry.contains(char::is_whitespace)
        }
        None => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::InvalidDataMount(entry.to_string()))
    }
}

/// Ordered set of data mounts.
///
/// Insertion order is kept so the rendered command is reproducible;
/// repeated entries are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DataMounts(Vec<String>);

impl DataMounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list, skipping unset entries.
    pub fn parse_list(list: &str) -> Self {
        list.split(',').map(str::trim).filter(|e| !is_unset(e)).collect()
    }

    /// Insert an entry; returns false if it was already present.
    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        let entry = entry.into();
        if self.0.contains(&entry) {
            return false;
        }
        self.0.push(entry);
        true
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.iter().any(|e| e == entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for DataMounts {
    fn from(entries: Vec<String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<DataMounts> for Vec<String> {
    fn from(mounts: DataMounts) -> Self {
        mounts.0
    }
}

impl<S: Into<String>> FromIterator<S> for DataMounts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut mounts = DataMounts::new();
        for entry in iter {
            mounts.insert(entry);
        }
        mounts
    }
}

/// Description of a training job to launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Base job name; the submitted name carries a timestamp suffix
    pub name: String,

    pub job_type: JobType,

    /// Workload container image
    pub image: String,

    /// The workload's own shell command
    pub command: String,

    /// GPUs per worker (0 = scheduler default)
    pub gpus: u32,

    /// CPU request (0 = scheduler default)
    pub cpu: u32,

    /// Memory request (0 = scheduler default)
    pub memory: u32,

    /// Worker count, MPI jobs only
    pub workers: u32,

    pub data_mounts: DataMounts,

    /// Mount holding the job's output; merged into `data_mounts` on render
    pub output_data_mount: Option<String>,

    pub enable_tensorboard: bool,

    pub tensorboard_image: String,

    /// RDMA networking, MPI jobs only
    pub rdma: bool,

    /// Local log directory, passed on only if it exists at build time
    pub log_directory: Option<PathBuf>,
}

impl JobSpec {
    /// Create a spec with every optional field at its default
    pub fn new(
        name: impl Into<String>,
        job_type: JobType,
        image: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            job_type,
            image: image.into(),
            command: command.into(),
            gpus: 0,
            cpu: 0,
            memory: 0,
            workers: 1,
            data_mounts: DataMounts::new(),
            output_data_mount: None,
            enable_tensorboard: false,
            tensorboard_image: DEFAULT_TENSORBOARD_IMAGE.to_string(),
            rdma: false,
            log_directory: None,
        }
    }

    pub fn with_resources(mut self, gpus: u32, cpu: u32, memory: u32) -> Self {
        self.gpus = gpus;
        self.cpu = cpu;
        self.memory = memory;
        self
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_data_mounts<I, S>(mut self, mounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_mounts = mounts.into_iter().collect();
        self
    }

    pub fn with_output_data_mount(mut self, mount: impl Into<String>) -> Self {
        self.output_data_mount = Some(mount.into());
        self
    }

    /// Enable tensorboard. An empty image keeps the default one.
    pub fn with_tensorboard(mut self, enabled: bool, image: impl Into<String>) -> Self {
        let image = image.into();
        self.enable_tensorboard = enabled;
        self.tensorboard_image = if image.trim().is_empty() {
            DEFAULT_TENSORBOARD_IMAGE.to_string()
        } else {
            image
        };
        self
    }

    pub fn with_rdma(mut self, rdma: bool) -> Self {
        self.rdma = rdma;
        self
    }

    pub fn with_log_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_directory = Some(dir.into());
        self
    }

    /// Mounts as rendered: `data_mounts` plus the output mount if absent.
    pub fn effective_mounts(&self) -> DataMounts {
        let mut mounts: DataMounts = self.data_mounts.iter().collect();
        if let Some(ref output) = self.output_data_mount {
            mounts.insert(output.clone());
        }
        mounts
    }

    /// Check every invariant the command line depends on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.command.trim().is_empty() {
            return Err(ValidationError::MissingCommand);
        }
        if self.job_type.is_distributed() && self.workers < 1 {
            return Err(ValidationError::InvalidWorkers(self.workers));
        }
        for mount in self.effective_mounts().iter() {
            validate_mount(mount)?;
        }
        Ok(())
    }
}

/// Handle for a submitted job
///
/// Fixed at submission time; the full name is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    base_name: String,
    full_name: String,
    job_type: JobType,
    submitted_at: DateTime<Local>,
}

impl JobHandle {
    /// Derive the handle for a job submitted at `submitted_at`
    pub fn new(base_name: impl Into<String>, job_type: JobType, submitted_at: DateTime<Local>) -> Self {
        let base_name = base_name.into();
        let full_name = format!(
            "{}{}",
            base_name,
            submitted_at.format(FULL_NAME_SUFFIX_FORMAT)
        );
        Self {
            base_name,
            full_name,
            job_type,
            submitted_at,
        }
    }

    /// Derive the handle for a job submitted now
    pub fn submitted_now(base_name: impl Into<String>, job_type: JobType) -> Self {
        Self::new(base_name, job_type, Local::now())
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Name the scheduler knows the job by
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn submitted_at(&self) -> DateTime<Local> {
        self.submitted_at
    }
}

/// Generate a run id using ULID (sortable, log-friendly)
pub fn generate_run_id() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_spec() -> JobSpec {
        JobSpec::new("train", JobType::Standalone, "x", "python run.py")
    }

    #[test]
    fn test_new_spec_defaults() {
        let spec = make_spec();
        assert_eq!(spec.workers, 1);
        assert_eq!(spec.gpus, 0);
        assert_eq!(spec.tensorboard_image, DEFAULT_TENSORBOARD_IMAGE);
        assert!(spec.data_mounts.is_empty());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_data_mounts_dedupe_keeps_order() {
        let mounts: DataMounts = vec!["b:/b", "a:/a", "b:/b", "c:/c", "a:/a"]
            .into_iter()
            .collect();
        assert_eq!(mounts.iter().collect::<Vec<_>>(), vec!["b:/b", "a:/a", "c:/c"]);
    }

    #[test]
    fn test_data_mounts_deserialize_dedupes() {
        let mounts: DataMounts = serde_json::from_str(r#"["d:/t", "e:/u", "d:/t"]"#).unwrap();
        assert_eq!(mounts.len(), 2);
        assert_eq!(serde_json::to_string(&mounts).unwrap(), r#"["d:/t","e:/u"]"#);
    }

    #[test]
    fn test_data_mounts_parse_list_skips_sentinel() {
        assert!(DataMounts::parse_list("None").is_empty());
        assert!(DataMounts::parse_list("").is_empty());
        let mounts = DataMounts::parse_list("d:/t, e:/u,None,d:/t");
        assert_eq!(mounts.iter().collect::<Vec<_>>(), vec!["d:/t", "e:/u"]);
    }

    #[test]
    fn test_effective_mounts_merges_output() {
        let spec = make_spec()
            .with_data_mounts(["d:/t"])
            .with_output_data_mount("out:/out");
        let mounts = spec.effective_mounts();
        assert_eq!(mounts.iter().collect::<Vec<_>>(), vec!["d:/t", "out:/out"]);

        let spec = make_spec()
            .with_data_mounts(["out:/out", "d:/t"])
            .with_output_data_mount("out:/out");
        assert_eq!(spec.effective_mounts().len(), 2);
    }

    #[test]
    fn test_validate_missing_command() {
        let spec = JobSpec::new("train", JobType::Standalone, "x", "  ");
        assert_eq!(spec.validate(), Err(ValidationError::MissingCommand));
    }

    #[test]
    fn test_validate_missing_name() {
        let spec = JobSpec::new("", JobType::Standalone, "x", "python run.py");
        assert_eq!(spec.validate(), Err(ValidationError::MissingName));
    }

    #[test]
    fn test_validate_workers_only_for_mpi() {
        let mpi = JobSpec::new("m", JobType::DistributedMpi, "x", "mpirun foo").with_workers(0);
        assert_eq!(mpi.validate(), Err(ValidationError::InvalidWorkers(0)));

        let standalone = make_spec().with_workers(0);
        assert!(standalone.validate().is_ok());
    }

    #[test]
    fn test_validate_mount_shape() {
        assert!(validate_mount("data:/training").is_ok());
        assert!(validate_mount("data").is_err());
        assert!(validate_mount(":/training").is_err());
        assert!(validate_mount("data:").is_err());
        assert!(validate_mount("da ta:/t").is_err());

        let spec = make_spec().with_output_data_mount("broken");
        assert_eq!(
            spec.validate(),
            Err(ValidationError::InvalidDataMount("broken".to_string()))
        );
    }

    #[test]
    fn test_tensorboard_empty_image_keeps_default() {
        let spec = make_spec().with_tensorboard(true, "");
        assert!(spec.enable_tensorboard);
        assert_eq!(spec.tensorboard_image, DEFAULT_TENSORBOARD_IMAGE);
    }

    #[test]
    fn test_handle_full_name() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        let handle = JobHandle::new("train", JobType::DistributedMpi, at);
        assert_eq!(handle.full_name(), "train20240307090502");
        assert_eq!(handle.base_name(), "train");
        assert_eq!(handle.job_type(), JobType::DistributedMpi);
        assert_eq!(handle.submitted_at(), at);
    }

    #[test]
    fn test_is_unset() {
        assert!(is_unset("None"));
        assert!(is_unset(" "));
        assert!(!is_unset("out:/out"));
        assert_eq!(normalize_optional(Some("None".to_string())), None);
        assert_eq!(
            normalize_optional(Some("/output".to_string())),
            Some("/output".to_string())
        );
    }

    #[test]
    fn test_run_id_is_lowercase_ulid() {
        let id = generate_run_id();
        assert_eq!(id.len(), 26);
        assert_eq!(id, id.to_lowercase());
    }
}
