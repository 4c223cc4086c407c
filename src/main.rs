//! `gitemplate` command-line entry point.
use std::process::ExitCode;

use clap::Parser;

use gitemplate::cli::Cli;
use gitemplate::commands::scaffold;
use gitemplate::error::describe_failure;
use gitemplate::logging::{Logger, init_subscriber};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    init_subscriber(args.verbose);
    let log = Logger::new();

    match scaffold::run(&args, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&describe_failure(&e));
            ExitCode::FAILURE
        }
    }
}
