use std::process::ExitCode;

use clap::Parser;
use mediasort::cli::{Cli, run_cli};
use mediasort::error::{EXIT_FATAL, EXIT_INTERRUPTED, EXIT_SUCCESS};
use mediasort::logging::init_logging;
use mediasort::output::OutputFormatter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match run_cli(&cli) {
        Ok(report) if report.interrupted() => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::from(EXIT_FATAL)
        }
    }
}
