//! Launcher command line
//!
//! `arena-launcher [FLAGS] <job|mpijob> -- <workload command...>`
//!
//! Everything after `--` is joined with spaces into the workload command.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{json, Value};

use crate::config::LauncherConfig;
use crate::job::{normalize_optional, DataMounts, JobSpec, JobType};
use crate::run::LaunchOptions;

/// Sub-commands that select the job type
const JOB_SUBCOMMANDS: &[&str] = &["job", "mpijob"];

/// Parse a boolean flag value. `yes`, `true`, `t` and `1` are true in any
/// case; anything else is false.
///
/// A sub-command name is rejected: a bare `--rdma mpijob` would otherwise
/// swallow the sub-command as the flag's value.
pub fn parse_flag(value: &str) -> Result<bool, String> {
    if JOB_SUBCOMMANDS.contains(&value) {
        return Err(format!(
            "`{value}` is a sub-command, not a flag value; write the flag as `--flag=true` \
             or move it before another option"
        ));
    }
    Ok(matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "t" | "1"
    ))
}

#[derive(Debug, Parser)]
#[command(name = "arena-launcher")]
#[command(about = "Submit a training job, follow it and record its outputs", version)]
pub struct Cli {
    #[command(flatten)]
    pub launch: LaunchArgs,

    #[command(subcommand)]
    pub job: JobCommand,
}

#[derive(Debug, Clone, Args)]
pub struct LaunchArgs {
    /// Base job name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Enable tensorboard (yes/true/t/1)
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_flag)]
    pub tensorboard: bool,

    /// Enable RDMA networking, MPI jobs only (yes/true/t/1)
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_flag)]
    pub rdma: bool,

    /// Tensorboard image; empty keeps the default
    #[arg(long, default_value = arena_protocol::DEFAULT_TENSORBOARD_IMAGE)]
    pub tensorboard_image: String,

    /// Minutes to wait for the job before giving up
    #[arg(long)]
    pub timeout_minutes: Option<u64>,

    /// Output location reported when there is no output data mount
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Output data mount (`source:target`); `None` means unset
    #[arg(long)]
    pub output_data: Option<String>,

    /// Local log directory, passed on only if it exists
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Comma-separated data mounts; `None` means unset
    #[arg(long)]
    pub data: Option<String>,

    /// Workload container image
    #[arg(long, default_value = "")]
    pub image: String,

    #[arg(long, default_value_t = 0)]
    pub gpus: u32,

    #[arg(long, default_value_t = 0)]
    pub cpu: u32,

    #[arg(long, default_value_t = 0)]
    pub memory: u32,

    /// Worker count, MPI jobs only
    #[arg(long, default_value_t = 2)]
    pub workers: u32,

    /// Launcher config file (TOML)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Scheduler CLI binary
    #[arg(long)]
    pub scheduler_bin: Option<String>,

    #[arg(long)]
    pub poll_interval_seconds: Option<u64>,

    /// Where the pipeline UI metadata is written
    #[arg(long)]
    pub metadata_path: Option<PathBuf>,

    /// Where the output path is written
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Wait for the job to start running or to finish
    #[arg(long, value_parser = ["running", "terminal"])]
    pub wait_until: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum JobCommand {
    /// Standalone training job
    Job {
        /// Workload command (after --)
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Distributed MPI training job
    Mpijob {
        /// Workload command (after --)
        #[arg(last = true)]
        command: Vec<String>,
    },
}

impl JobCommand {
    pub fn job_type(&self) -> JobType {
        match self {
            JobCommand::Job { .. } => JobType::Standalone,
            JobCommand::Mpijob { .. } => JobType::DistributedMpi,
        }
    }

    /// Workload command, joined with spaces
    pub fn command(&self) -> String {
        match self {
            JobCommand::Job { command } | JobCommand::Mpijob { command } => command.join(" "),
        }
    }
}

impl Cli {
    /// Job spec described by the flags. Not validated here.
    pub fn job_spec(&self) -> JobSpec {
        let args = &self.launch;
        let mut spec = JobSpec::new(
            args.name.clone(),
            self.job.job_type(),
            args.image.clone(),
            self.job.command(),
        )
        .with_resources(args.gpus, args.cpu, args.memory)
        .with_workers(args.workers)
        .with_tensorboard(args.tensorboard, args.tensorboard_image.clone())
        .with_rdma(args.rdma);

        if let Some(ref data) = args.data {
            spec.data_mounts = DataMounts::parse_list(data);
        }
        if let Some(mount) = normalize_optional(args.output_data.clone()) {
            spec = spec.with_output_data_mount(mount);
        }
        if let Some(ref dir) = args.log_dir {
            if !dir.as_os_str().is_empty() {
                spec = spec.with_log_directory(dir);
            }
        }
        spec
    }

    /// CLI layer for `LauncherConfig::load`; flags not given are `null`.
    pub fn config_overrides(&self) -> Value {
        let args = &self.launch;
        json!({
            "scheduler_bin": args.scheduler_bin,
            "poll_interval_seconds": args.poll_interval_seconds,
            "timeout_minutes": args.timeout_minutes,
            "metadata_path": args.metadata_path,
            "output_file": args.output_file,
            "wait_mode": args.wait_until,
        })
    }

    pub fn launch_options(&self, config: &LauncherConfig) -> LaunchOptions {
        LaunchOptions {
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            wait_mode: config.wait_mode,
            output_dir: normalize_optional(self.launch.output_dir.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::WaitMode;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_flag_values() {
        for truthy in ["yes", "True", "T", "1", " true "] {
            assert!(parse_flag(truthy).unwrap(), "{truthy}");
        }
        for falsy in ["no", "False", "0", "", "maybe"] {
            assert!(!parse_flag(falsy).unwrap(), "{falsy}");
        }
    }

    #[test]
    fn test_parse_flag_rejects_subcommands() {
        assert!(parse_flag("job").is_err());
        assert!(parse_flag("mpijob").is_err());
    }

    #[test]
    fn test_bare_flag_before_subcommand_is_an_error() {
        let result = Cli::try_parse_from(["arena-launcher", "--name", "a", "--rdma", "mpijob", "--", "x"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["arena-launcher", "--name", "a", "--tensorboard", "job", "--", "x"]);
        assert!(result.is_err());

        let cli = parse(&["arena-launcher", "--name", "a", "--rdma=true", "mpijob", "--", "x"]);
        assert!(cli.launch.rdma);
        assert_eq!(cli.job.job_type(), JobType::DistributedMpi);
    }

    #[test]
    fn test_standalone_job() {
        let cli = parse(&[
            "arena-launcher", "--name", "train", "--image", "x", "job", "--", "python", "run.py",
        ]);
        let spec = cli.job_spec();

        assert_eq!(spec.name, "train");
        assert_eq!(spec.job_type, JobType::Standalone);
        assert_eq!(spec.image, "x");
        assert_eq!(spec.command, "python run.py");
        assert!(!spec.enable_tensorboard);
        assert!(spec.data_mounts.is_empty());
    }

    #[test]
    fn test_mpijob_with_resources() {
        let cli = parse(&[
            "arena-launcher", "--name", "dist", "--gpus", "1", "--workers", "4", "--rdma", "true",
            "mpijob", "--", "mpirun", "foo",
        ]);
        let spec = cli.job_spec();

        assert_eq!(spec.job_type, JobType::DistributedMpi);
        assert_eq!(spec.gpus, 1);
        assert_eq!(spec.workers, 4);
        assert!(spec.rdma);
        assert_eq!(spec.command, "mpirun foo");
    }

    #[test]
    fn test_default_workers_is_two() {
        let cli = parse(&["arena-launcher", "--name", "dist", "mpijob", "--", "mpirun", "foo"]);
        assert_eq!(cli.job_spec().workers, 2);
    }

    #[test]
    fn test_bare_and_valued_boolean_flags() {
        let cli = parse(&["arena-launcher", "--tensorboard", "--name", "a", "job", "--", "x"]);
        assert!(cli.launch.tensorboard);

        let cli = parse(&["arena-launcher", "--name", "a", "--tensorboard", "False", "job", "--", "x"]);
        assert!(!cli.launch.tensorboard);

        let cli = parse(&["arena-launcher", "--name", "a", "--tensorboard=yes", "job", "--", "x"]);
        assert!(cli.launch.tensorboard);
    }

    #[test]
    fn test_none_sentinels_are_unset() {
        let cli = parse(&[
            "arena-launcher", "--name", "a", "--data", "None", "--output-data", "None",
            "--output-dir", "None", "job", "--", "x",
        ]);
        let spec = cli.job_spec();

        assert!(spec.data_mounts.is_empty());
        assert!(spec.output_data_mount.is_none());
        let options = cli.launch_options(&LauncherConfig::default());
        assert!(options.output_dir.is_none());
    }

    #[test]
    fn test_data_list_and_output_mount() {
        let cli = parse(&[
            "arena-launcher", "--name", "a", "--data", "d1:/data,d2:/data2,d1:/data",
            "--output-data", "out:/output", "job", "--", "x",
        ]);
        let spec = cli.job_spec();

        assert_eq!(spec.data_mounts.iter().collect::<Vec<_>>(), vec!["d1:/data", "d2:/data2"]);
        assert_eq!(spec.output_data_mount.as_deref(), Some("out:/output"));
    }

    #[test]
    fn test_empty_tensorboard_image_keeps_default() {
        let cli = parse(&["arena-launcher", "--name", "a", "--tensorboard-image", "", "job", "--", "x"]);
        assert_eq!(cli.job_spec().tensorboard_image, arena_protocol::DEFAULT_TENSORBOARD_IMAGE);
    }

    #[test]
    fn test_missing_command_parses_but_fails_validation() {
        let cli = parse(&["arena-launcher", "--name", "a", "job"]);
        assert!(cli.job_spec().validate().is_err());
    }

    #[test]
    fn test_overrides_reach_config() {
        let cli = parse(&[
            "arena-launcher", "--name", "a", "--timeout-minutes", "5", "--wait-until", "terminal",
            "--scheduler-bin", "/usr/local/bin/arena", "job", "--", "x",
        ]);
        let config = LauncherConfig::load(None, Some(cli.config_overrides())).unwrap();

        assert_eq!(config.timeout_minutes, 5);
        assert_eq!(config.wait_mode, WaitMode::Terminal);
        assert_eq!(config.scheduler_bin, "/usr/local/bin/arena");
        assert_eq!(config.poll_interval_seconds, 3);

        let options = cli.launch_options(&config);
        assert_eq!(options.timeout, Duration::from_secs(300));
        assert_eq!(options.wait_mode, WaitMode::Terminal);
    }

    #[test]
    fn test_unknown_wait_mode_rejected() {
        let result = Cli::try_parse_from([
            "arena-launcher", "--name", "a", "--wait-until", "forever", "job", "--", "x",
        ]);
        assert!(result.is_err());
    }
}
