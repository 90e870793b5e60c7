//! The teardown command: drop the test database after a run

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;

use crate::config::HarnessConfig;
use crate::connection::test_database_name;
use crate::service::{DatabaseAdmin, HttpAdmin};

/// Drop the test database. Destruction errors propagate uninterpreted;
/// callers run this only when they know the database exists.
pub fn cmd_teardown(config: &HarnessConfig, force: bool) -> Result<()> {
    let name = test_database_name(&config.service.database);

    if !force {
        let confirm = Confirm::new()
            .with_prompt(format!("Drop test database '{name}'?"))
            .default(false)
            .interact()?;

        if !confirm {
            println!("{} Cancelled.", "!".yellow());
            return Ok(());
        }
    }

    let admin = HttpAdmin::new(&config.service);
    admin
        .drop_database(&name)
        .with_context(|| format!("dropping test database '{name}'"))?;

    println!("{} Dropped '{}'", "✓".green(), name);
    Ok(())
}
