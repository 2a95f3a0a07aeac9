// ============================================================================
// framescale-cli/src/output.rs
// ============================================================================
//
// TERMINAL OUTPUT: Styled summaries and error reports
//
// Results go to stdout, errors to stderr. Styling comes from `console`,
// which drops colors automatically when the stream is not a terminal.

use console::style;
use framescale_core::{Config, CoreError, RunReport, format_bytes, format_duration};

/// Prints a section heading.
pub fn print_heading(title: &str) {
    println!("\n{}", style(format!("----- {} -----", title.to_uppercase())).cyan().bold());
}

/// Prints an aligned label/value line.
pub fn print_info(label: &str, value: impl std::fmt::Display) {
    println!("  {:<18} {}", format!("{label}:"), style(value).bold());
}

/// Prints a success message with a green checkmark.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Prints the effective configuration.
pub fn print_settings(config: &Config) {
    print_heading("Configuration");
    print_info("Algorithm", config.algorithm);
    print_info("Magnification", format!("{}x", config.magnification_factor));
    print_info("Output scale", format!("{}%", config.scale_factor));
    print_info("Container", &config.container);
    print_info("Workers", config.worker_count());
    print_info(
        "Resizer timeout",
        config
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string()),
    );
    print_info("Failure policy", config.failure_policy);
    print_info("Encoder args", config.encoder_arg_list().join(" "));
    print_info("Image resizer", config.resizer_path.display());
    if let Some(dir) = &config.temp_dir {
        print_info("Temp dir", dir.display());
    }
}

/// Prints the summary of a finished run.
pub fn print_report(report: &RunReport) {
    print_heading("Upscale complete");
    print_info("Input", report.input.display());
    print_info("Output", report.output.display());
    print_info("Frames", report.frame_count);
    print_info(
        "Source",
        format!(
            "{}x{} @ {} fps",
            report.properties.width, report.properties.height, report.properties.frame_rate
        ),
    );
    print_info("Output size", format_bytes(report.output_size));
    print_info("Elapsed", format_duration(report.elapsed.as_secs_f64()));
    println!();
    print_success("Done");
}

/// Prints an error with its kind, the failing command and frame when known.
pub fn print_error(error: &CoreError) {
    eprintln!(
        "{} {} {}",
        style("Error").red().bold(),
        style(format!("[{}]", error.kind_name())).red(),
        error
    );
    if let Some(index) = error.frame_index() {
        eprintln!("  {} {}", style("frame:").dim(), index);
    }
}
