// framescale-cli/src/commands/run.rs
//
// The `run` command: loads the configuration, verifies the external tools and
// drives one pipeline run with a terminal progress display.

use crate::cli::RunArgs;
use crate::error::CliResult;
use crate::output::print_report;
use crate::progress::TerminalProgress;

use framescale_core::external::check_dependencies;
use framescale_core::{
    CancellationToken, Config, CrateFfprobeExecutor, Pipeline, RunReport, SidecarSpawner,
    SystemCommandRunner,
};
use indicatif::MultiProgress;
use log::info;

/// Upscales `args.input`. `cancel` is tripped by the interrupt handler and
/// bars are drawn into `multi`, the same one the console logger suspends.
pub fn run_upscale(
    args: RunArgs,
    cancel: CancellationToken,
    multi: MultiProgress,
) -> CliResult<RunReport> {
    let config = Config::load(&args.config.path)?;
    info!(
        "Using {} ({} {}x, output scale {}%)",
        args.config.path.display(),
        config.algorithm,
        config.magnification_factor,
        config.scale_factor
    );

    check_dependencies(&config)?;

    let spawner = SidecarSpawner;
    let prober = CrateFfprobeExecutor::new();
    let runner = SystemCommandRunner;
    let progress = TerminalProgress::new(multi);

    let mut pipeline = Pipeline::new(&config, &spawner, &prober, &runner)
        .with_progress(&progress)
        .with_cancellation(cancel)
        .verbose(args.verbose);

    let report = pipeline.run(&args.input, args.output.as_deref())?;
    print_report(&report);
    Ok(report)
}
