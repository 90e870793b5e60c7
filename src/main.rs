//! scratchdb CLI - disposable test database lifecycle manager
//!
//! This file contains only CLI dispatch logic. All command implementations
//! are in the `commands/` module. `prepare` failures carry their own exit
//! status: 1 when the user declines destructive recreation, 2 when the
//! recreation attempt itself fails.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;

use scratchdb::{
    Cli, Commands, CompletionsCommands, HarnessConfig, PrepareError, cmd_info, cmd_prepare,
    cmd_skips, cmd_teardown, run_options,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HarnessConfig::load()?;

    match cli.command {
        Commands::Prepare {
            autoclobber,
            keepdb,
            no_snapshot,
            quiet,
            verbose,
        } => {
            let opts = run_options(autoclobber, keepdb, no_snapshot, quiet, verbose);
            match cmd_prepare(&config, &opts) {
                Ok(_) => Ok(()),
                Err(PrepareError::Other(err)) => Err(err),
                Err(err) => {
                    eprintln!("{} {}", "✗".red(), err);
                    std::process::exit(err.exit_code());
                }
            }
        }

        Commands::Teardown { force } => cmd_teardown(&config, force),

        Commands::Skips => cmd_skips(&config),

        Commands::Info => cmd_info(&config),

        Commands::Completions(command) => match command {
            CompletionsCommands::Generate { shell } => {
                let mut cmd = Cli::command();
                let name = cmd.get_name().to_string();
                generate(shell, &mut cmd, name, &mut std::io::stdout());
                Ok(())
            }
        },
    }
}
