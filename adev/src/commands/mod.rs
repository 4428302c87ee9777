use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

/// AppStudio's e2e development tool
#[derive(Parser, Debug)]
#[command(
    version,
    bin_name = "adev",
    infer_subcommands = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn exec(self) -> anyhow::Result<()> {
        self.command.exec()
    }
}

crate::cli_commands! {
    mod bundle,
    mod ci,
    mod local,
    mod webhook,
}
