// framescale-cli/src/commands/check.rs
//
// Loads the configuration, checks ffmpeg, ffprobe and the image resizer, and
// prints the effective settings.

use crate::cli::CheckArgs;
use crate::error::CliResult;
use crate::output::{print_settings, print_success};

use framescale_core::Config;
use framescale_core::external::check_dependencies;

pub fn run_check(args: CheckArgs) -> CliResult<()> {
    let config = Config::load(&args.config.path)?;
    print_settings(&config);

    check_dependencies(&config)?;
    println!();
    print_success(&format!(
        "{} is valid and ffmpeg, ffprobe and the image resizer are available",
        args.config.path.display()
    ));
    Ok(())
}
