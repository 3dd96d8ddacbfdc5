//! deployctl - Entry Point
//!
//! Deploys applications to a deploy service and manages their revisions.

use std::process::ExitCode;

use clap::Parser;

use deployctl::app::run::run;
use deployctl::cli::args::Cli;
use deployctl::cli::output::print_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.app_options();

    match run(options, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}
