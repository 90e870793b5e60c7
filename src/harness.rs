//! Test database creation and destruction
//!
//! The orchestrator creates the uniquely named test database, resolves a
//! conflict with an existing one (keep, clobber, or cancel), provisions
//! the cache table, captures the initial-state snapshot, and leaves the
//! connection pointing at the ready database.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use colored::Colorize;
use thiserror::Error;

use crate::connection::{Connection, test_database_name};
use crate::models::{RunOptions, ServiceFeatures};
use crate::service::{DatabaseAdmin, ServiceError};
use crate::skips::{self, SkipRegistry};
use crate::snapshot::{self, StateCodec};

/// Name of the cache table provisioned once the database is ready
pub const CACHE_TABLE: &str = "scratch_cache";

/// How `prepare` failed. The command layer maps this to the process exit
/// status; the orchestrator itself never terminates the process.
#[derive(Debug, Error)]
pub enum PrepareError {
    /// The user declined destructive recreation (exit status 1)
    #[error("tests cancelled: recreation of '{0}' declined")]
    Cancelled(String),

    /// Destroy-and-recreate itself failed; never retried (exit status 2)
    #[error("recreating test database '{name}' failed: {source}")]
    Recreate {
        name: String,
        #[source]
        source: ServiceError,
    },

    /// Anything else, propagated uninterpreted
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PrepareError {
    /// Exit status the CLI reports for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            PrepareError::Cancelled(_) => 1,
            PrepareError::Recreate { .. } => 2,
            PrepareError::Other(_) => 1,
        }
    }
}

/// Asks whether an existing test database may be destroyed
pub trait ClobberConfirm {
    fn confirm(&self, database: &str) -> Result<bool>;
}

/// Interactive provider: only the literal answer `yes` proceeds
pub struct PromptConfirm;

impl ClobberConfirm for PromptConfirm {
    fn confirm(&self, database: &str) -> Result<bool> {
        let answer: String = dialoguer::Input::new()
            .with_prompt(format!(
                "Type 'yes' if you would like to try deleting the test database \
                 '{database}', or 'no' to cancel"
            ))
            .allow_empty(true)
            .interact_text()?;
        Ok(answer == "yes")
    }
}

/// Canned provider for non-interactive harnesses
pub struct AutoConfirm(pub bool);

impl ClobberConfirm for AutoConfirm {
    fn confirm(&self, _database: &str) -> Result<bool> {
        Ok(self.0)
    }
}

/// Administrative command run once against the ready database.
/// Failures are not interpreted here; they propagate to the caller.
pub trait AdminCommand {
    fn run(&self, database: &str) -> Result<()>;
}

/// Provisions the fixed cache table through the service DDL endpoint
pub struct CreateCacheTable<'a> {
    pub admin: &'a dyn DatabaseAdmin,
}

impl AdminCommand for CreateCacheTable<'_> {
    fn run(&self, database: &str) -> Result<()> {
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {CACHE_TABLE} (\
             cache_key VARCHAR(255) NOT NULL PRIMARY KEY, \
             content TEXT NOT NULL, \
             expires TIMESTAMP)"
        );
        self.admin
            .execute_ddl(database, &statement)
            .with_context(|| format!("provisioning cache table '{CACHE_TABLE}' on '{database}'"))
    }
}

/// Creation/destruction orchestrator for the disposable test database
pub struct Harness<'a> {
    admin: &'a dyn DatabaseAdmin,
    cache: &'a dyn AdminCommand,
    confirm: &'a dyn ClobberConfirm,
    codec: &'a dyn StateCodec,
}

impl<'a> Harness<'a> {
    pub fn new(
        admin: &'a dyn DatabaseAdmin,
        cache: &'a dyn AdminCommand,
        confirm: &'a dyn ClobberConfirm,
        codec: &'a dyn StateCodec,
    ) -> Self {
        Harness {
            admin,
            cache,
            confirm,
            codec,
        }
    }

    /// Entry point: create (or reuse) the test database, then leave the
    /// connection pointing at it with the cache table provisioned and,
    /// when requested, an initial-state snapshot attached.
    pub fn prepare(
        &self,
        conn: &mut Connection,
        registry: &mut SkipRegistry,
        features: &ServiceFeatures,
        enabled_apps: &BTreeSet<String>,
        opts: &RunOptions,
    ) -> Result<String, PrepareError> {
        if skips::skips_enabled() {
            let added = registry.mark_skips(features, enabled_apps)?;
            if opts.verbosity >= 2 && added > 0 {
                println!("{} Registered {} skipped tests", ">".cyan(), added);
            }
        }

        let name = test_database_name(conn.configured_name());

        if opts.verbosity >= 1 {
            let action = if opts.keepdb { "Using existing" } else { "Creating" };
            println!(
                "{} {} test database for alias '{}'{}...",
                ">".cyan(),
                action,
                conn.configured_name(),
                display_suffix(opts.verbosity, &name)
            );
        }

        // The create is attempted even with keepdb: the database may not
        // exist yet, in which case it must be created and simply not
        // destroyed afterwards.
        self.create_or_reuse(&name, opts)?;

        conn.switch_to(name.clone());

        self.cache.run(&name)?;

        if opts.serialize {
            snapshot::capture(self.codec, conn)?;
        }

        conn.ensure_open(self.admin)
            .with_context(|| format!("test database '{name}' is not reachable"))?;

        Ok(name)
    }

    fn create_or_reuse(&self, name: &str, opts: &RunOptions) -> Result<(), PrepareError> {
        let Err(err) = self.admin.create_database(name) else {
            return Ok(());
        };

        // The existing database is assumed usable; under keepdb any
        // creation error abandons the attempt, not only the conflict case.
        if opts.keepdb {
            return Ok(());
        }

        println!(
            "{} Got an error creating the test database: {}",
            "!".yellow(),
            err
        );

        let clobber = opts.autoclobber || self.confirm.confirm(name)?;
        if !clobber {
            println!("{} Tests cancelled.", "!".yellow());
            return Err(PrepareError::Cancelled(name.to_string()));
        }

        if opts.verbosity >= 1 {
            println!("{} Destroying old test database '{}'...", "!".yellow(), name);
        }
        self.destroy_and_recreate(name).map_err(|source| {
            println!(
                "{} Got an error recreating the test database: {}",
                "!".yellow(),
                source
            );
            PrepareError::Recreate {
                name: name.to_string(),
                source,
            }
        })
    }

    fn destroy_and_recreate(&self, name: &str) -> Result<(), ServiceError> {
        self.admin.drop_database(name)?;
        self.admin.create_database(name)
    }

    /// Issue a create for `name`. No bootstrap or default-catalog
    /// connection is involved: the service creates named databases
    /// directly.
    pub fn create(&self, name: &str) -> Result<(), ServiceError> {
        self.admin.create_database(name)
    }

    /// Drop `name`. Fails loudly when the database does not exist;
    /// callers invoke this only when they know it does.
    pub fn destroy(&self, name: &str) -> Result<(), ServiceError> {
        self.admin.drop_database(name)
    }
}

/// At higher verbosity the action line also shows the resolved name
fn display_suffix(verbosity: u8, name: &str) -> String {
    if verbosity >= 2 {
        format!(" ('{name}')")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryAdmin;

    // ==================== Exit Code Tests ====================

    #[test]
    fn test_exit_codes() {
        assert_eq!(PrepareError::Cancelled("test_app".to_string()).exit_code(), 1);
        assert_eq!(
            PrepareError::Recreate {
                name: "test_app".to_string(),
                source: ServiceError::Status {
                    status: 500,
                    message: "boom".to_string(),
                },
            }
            .exit_code(),
            2
        );
        assert_eq!(
            PrepareError::Other(anyhow::anyhow!("anything else")).exit_code(),
            1
        );
    }

    // ==================== Display Tests ====================

    #[test]
    fn test_display_suffix_only_when_verbose() {
        assert_eq!(display_suffix(1, "test_app"), "");
        assert_eq!(display_suffix(2, "test_app"), " ('test_app')");
    }

    // ==================== Collaborator Tests ====================

    #[test]
    fn test_auto_confirm_answers_without_prompting() {
        assert!(AutoConfirm(true).confirm("test_app").unwrap());
        assert!(!AutoConfirm(false).confirm("test_app").unwrap());
    }

    #[test]
    fn test_cache_table_command_targets_the_ready_database() {
        let admin = MemoryAdmin::new();
        admin.seed("test_app");

        let command = CreateCacheTable { admin: &admin };
        command.run("test_app").expect("provisioning");

        let log = admin.ddl_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, "test_app");
        assert!(log[0].1.contains(CACHE_TABLE));
        assert!(log[0].1.contains("IF NOT EXISTS"));
    }

    #[test]
    fn test_cache_table_failure_propagates() {
        let admin = MemoryAdmin::new();
        let command = CreateCacheTable { admin: &admin };
        assert!(command.run("test_app").is_err());
    }
}
