#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

#[macro_use]
mod macros;

mod app;
mod bundle;
mod commands;
mod e2e;
mod env;
mod git;
mod job_spec;
mod webhook;

use anyhow::Result;
use clap::Parser;
use commands::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    app::set_global_verbosity(cli.verbose.log_level_filter());
    app::set_global_path(app::find_repo_root()?);

    cli.exec()
}
