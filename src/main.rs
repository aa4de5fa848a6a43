//! Arena launcher CLI
//!
//! Entry point for the `arena-launcher` pipeline step.

use std::io;
use std::process;
use std::sync::Arc;

use arena_launcher::cli::Cli;
use arena_launcher::{
    CliScheduler, ExitCode, FailureKind, LaunchContext, LauncherConfig, MetadataWriter,
    Orchestrator, SchedulerClient, SystemClock,
};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_launcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!(args = %std::env::args().collect::<Vec<_>>().join(" "), "arena launcher started");

    let cli = Cli::parse();
    let code = run(cli);
    process::exit(code.as_i32());
}

fn run(cli: Cli) -> ExitCode {
    let config = match LauncherConfig::load(cli.launch.config.as_deref(), Some(cli.config_overrides())) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "{}", FailureKind::Config.description());
            return FailureKind::Config.exit_code();
        }
    };

    let spec = cli.job_spec();
    let ctx = LaunchContext::new(spec.name.clone());
    let scheduler: Arc<dyn SchedulerClient> =
        Arc::new(CliScheduler::new(ctx.clone(), config.scheduler_bin.clone()));
    let writer = MetadataWriter::new(ctx.clone(), &config.metadata_path, &config.output_file);

    let mut orchestrator = Orchestrator::new(
        ctx,
        scheduler,
        Arc::new(SystemClock),
        writer,
        cli.launch_options(&config),
    );

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    match orchestrator.run(&spec, &mut sink) {
        Ok(_) => ExitCode::Success,
        Err(e) => e.failure_kind().exit_code(),
    }
}
