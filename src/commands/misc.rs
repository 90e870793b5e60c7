//! Informational commands: info, skips

use anyhow::Result;
use colored::Colorize;
use comfy_table::{
    Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::config::HarnessConfig;
use crate::connection::test_database_name;
use crate::models::ServiceFeatures;
use crate::skips::SkipRegistry;

/// Show resolved configuration and database names
pub fn cmd_info(config: &HarnessConfig) -> Result<()> {
    println!("{}", "scratchdb".bold());
    println!("{}", "=".repeat("scratchdb".len()));

    println!(
        "\n{}: {}",
        "Config".bold(),
        HarnessConfig::config_path()?.display()
    );
    println!("{}: {}", "Endpoint".bold(), config.service.endpoint);
    println!("{}: {}", "Alias".bold(), config.service.database);
    println!(
        "{}: {}",
        "Test database".bold(),
        test_database_name(&config.service.database)
    );

    let apps = if config.apps.is_empty() {
        "(none)".to_string()
    } else {
        config.apps.join(", ")
    };
    println!("{}: {}", "Enabled apps".bold(), apps);

    Ok(())
}

/// List the tests that would be registered as skipped for this run
pub fn cmd_skips(config: &HarnessConfig) -> Result<()> {
    let features = ServiceFeatures::default().with_extra(&config.skip_tests);
    let apps = config.enabled_apps();

    let mut registry = SkipRegistry::new();
    registry.mark_skips(&features, &apps)?;

    if registry.is_empty() {
        println!("No tests are skipped for the enabled applications");
        return Ok(());
    }

    let term_width = terminal_size::terminal_size()
        .map(|(w, _)| w.0)
        .unwrap_or(120);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(term_width)
        .set_header(vec![
            Cell::new("Test").fg(Color::Cyan),
            Cell::new("App").fg(Color::Cyan),
            Cell::new("Reason").fg(Color::Cyan),
        ]);

    for (id, reason) in registry.iter() {
        let app = id.split('.').next().unwrap_or("-");
        table.add_row(vec![Cell::new(id), Cell::new(app), Cell::new(reason)]);
    }

    println!("{table}");
    println!("{} {} skipped tests", ">".cyan(), registry.len());

    Ok(())
}
