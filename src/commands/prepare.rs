//! The prepare command: set up the test database for a run

use colored::Colorize;

use crate::config::HarnessConfig;
use crate::connection::Connection;
use crate::harness::{CreateCacheTable, Harness, PrepareError, PromptConfirm};
use crate::models::{RunOptions, ServiceFeatures};
use crate::service::HttpAdmin;
use crate::skips::SkipRegistry;
use crate::snapshot::HttpCodec;

/// Map prepare CLI flags onto run options
pub fn run_options(
    autoclobber: bool,
    keepdb: bool,
    no_snapshot: bool,
    quiet: bool,
    verbose: bool,
) -> RunOptions {
    let verbosity = if quiet {
        0
    } else if verbose {
        2
    } else {
        1
    };
    RunOptions {
        verbosity,
        autoclobber,
        serialize: !no_snapshot,
        keepdb,
    }
}

/// Prepare the test database and report the resolved identifier
pub fn cmd_prepare(config: &HarnessConfig, opts: &RunOptions) -> Result<String, PrepareError> {
    let admin = HttpAdmin::new(&config.service);
    let codec = HttpCodec::new(&config.service);
    let cache = CreateCacheTable { admin: &admin };
    let confirm = PromptConfirm;
    let harness = Harness::new(&admin, &cache, &confirm, &codec);

    let mut conn = Connection::new(config.service.clone());
    let mut registry = SkipRegistry::new();
    let features = ServiceFeatures::default().with_extra(&config.skip_tests);
    let apps = config.enabled_apps();

    let name = harness.prepare(&mut conn, &mut registry, &features, &apps, opts)?;

    if opts.verbosity >= 1 {
        println!("{} Test database '{}' ready", "✓".green(), name);
        if conn.snapshot().is_some() {
            println!("{} Initial state captured for per-test resets", "+".green());
        }
        if !registry.is_empty() {
            println!("{} {} tests marked as skipped", "+".green(), registry.len());
        }
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options_defaults() {
        let opts = run_options(false, false, false, false, false);
        assert_eq!(opts, RunOptions::default());
    }

    #[test]
    fn test_run_options_flag_mapping() {
        let opts = run_options(true, true, true, true, false);
        assert!(opts.autoclobber);
        assert!(opts.keepdb);
        assert!(!opts.serialize);
        assert_eq!(opts.verbosity, 0);
    }

    #[test]
    fn test_run_options_verbose() {
        let opts = run_options(false, false, false, false, true);
        assert_eq!(opts.verbosity, 2);
        assert!(opts.serialize);
    }
}
