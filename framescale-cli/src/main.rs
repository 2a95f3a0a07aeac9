// ============================================================================
// framescale-cli/src/main.rs
// ============================================================================
//
// Entry point of the `framescale` binary.
//
// Responsibilities:
// - Parsing command-line arguments (`cli.rs`).
// - Installing console or file logging.
// - Installing the Ctrl+C handler that cancels the active run.
// - Dispatching to the command implementations.
// - Printing errors and mapping them to exit codes.

use clap::Parser;
use framescale_cli::error::{EXIT_INTERRUPTED, EXIT_SUCCESS, exit_code};
use framescale_cli::logging::init_logging;
use framescale_cli::output::print_error;
use framescale_cli::{Cli, Commands, run_check, run_upscale};
use framescale_core::CancellationToken;
use indicatif::MultiProgress;
use log::{info, warn};
use std::process;

fn main() {
    let cli = Cli::parse();

    let log_dir = match &cli.command {
        Commands::Run(args) => args.log_dir.clone(),
        Commands::Check(_) => None,
    };
    // Shared by the logger and the progress bars so log lines never split a bar.
    let multi = MultiProgress::new();
    match init_logging(log_dir.as_deref(), &multi) {
        Ok(Some(path)) => info!("Writing log file to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            print_error(&e);
            process::exit(exit_code(&e));
        }
    }

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel);

    let result = match cli.command {
        Commands::Run(args) => run_upscale(args, cancel, multi).map(|_| ()),
        Commands::Check(args) => run_check(args),
    };

    match result {
        Ok(()) => process::exit(EXIT_SUCCESS),
        Err(e) => {
            print_error(&e);
            process::exit(exit_code(&e));
        }
    }
}

/// First Ctrl+C cancels the run and lets cleanup happen; a second one exits immediately.
fn install_interrupt_handler(cancel: &CancellationToken) {
    let token = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            process::exit(EXIT_INTERRUPTED);
        }
        eprintln!("Interrupted, stopping and cleaning up (press Ctrl+C again to force quit)");
        token.cancel();
    });
    if let Err(e) = installed {
        warn!("Could not install Ctrl+C handler: {e}");
    }
}
