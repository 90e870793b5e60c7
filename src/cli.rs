use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scratchdb")]
#[command(about = "Disposable test database lifecycle manager for schema-ful database services")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create (or reuse) the test database and capture its initial state
    Prepare {
        /// Destroy and recreate an existing test database without asking
        #[arg(long)]
        autoclobber: bool,

        /// Reuse an existing test database instead of clobbering it
        #[arg(long)]
        keepdb: bool,

        /// Skip the initial-state snapshot
        #[arg(long)]
        no_snapshot: bool,

        /// Print nothing but errors
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Show resolved database names in action lines
        #[arg(short, long)]
        verbose: bool,
    },

    /// Drop the test database after a run
    Teardown {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// List tests skipped as unsupported by the target service
    Skips,

    /// Show resolved configuration and database names
    Info,

    /// Shell completions
    #[command(subcommand)]
    Completions(CompletionsCommands),
}

#[derive(Subcommand)]
pub enum CompletionsCommands {
    /// Print a completion script to stdout
    Generate {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "scratchdb",
            "prepare",
            "--autoclobber",
            "--keepdb",
            "--no-snapshot",
            "--quiet",
        ])
        .expect("arguments parse");

        match cli.command {
            Commands::Prepare {
                autoclobber,
                keepdb,
                no_snapshot,
                quiet,
                verbose,
            } => {
                assert!(autoclobber);
                assert!(keepdb);
                assert!(no_snapshot);
                assert!(quiet);
                assert!(!verbose);
            }
            _ => panic!("expected prepare"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["scratchdb", "prepare", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_teardown_force() {
        let cli = Cli::try_parse_from(["scratchdb", "teardown", "--force"]).expect("parse");
        match cli.command {
            Commands::Teardown { force } => assert!(force),
            _ => panic!("expected teardown"),
        }
    }

    #[test]
    fn test_completions_generate() {
        let cli =
            Cli::try_parse_from(["scratchdb", "completions", "generate", "bash"]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::Completions(CompletionsCommands::Generate { .. })
        ));
    }
}
