//! tidyup CLI
//!
//! Runs several analysis tools on a project and aggregates their results.
//!
//! Exit codes: `0` when no issue was found, `1` when issues were found or
//! the run was interrupted, `2` on configuration or runtime errors.

mod cli;
mod commands;
mod logging;
mod output;
mod progress;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;

use crate::cli::{Cli, Commands};
use crate::commands::check::run_check;
use crate::commands::default_config::run_default_config;
use crate::commands::extensions::run_extensions;
use crate::commands::list_codes::run_list_codes;

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.verbose);
    logging::install_panic_hook();

    match run(cli) {
        Ok(has_issues) => {
            if has_issues {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Check(args) => run_check(args),
        Commands::ListCodes { tools, format } => run_list_codes(tools, *format).map(|_| false),
        Commands::DefaultConfig => run_default_config().map(|_| false),
        Commands::Extensions { format } => run_extensions(*format).map(|_| false),
    }
}
