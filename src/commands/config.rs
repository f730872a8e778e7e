use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::options::config_path;
use crate::core::config::DashboardConfig;
use crate::ui::{confirm, dimmed, success};

pub fn handle_config(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", sub_matches)) => show(sub_matches),
        Some(("path", sub_matches)) => path(sub_matches),
        Some(("init", sub_matches)) => init(sub_matches),
        _ => {
            println!("Use 'mdash config --help' for more information.");
            Ok(())
        }
    }
}

fn show(matches: &ArgMatches) -> Result<()> {
    let path = config_path(matches)?;
    let config = DashboardConfig::load_from(&path)?;

    if !path.exists() {
        dimmed(&format!("No config file at {}; showing defaults", path.display()));
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("Failed to serialize config")?
    );
    Ok(())
}

fn path(matches: &ArgMatches) -> Result<()> {
    println!("{}", config_path(matches)?.display());
    Ok(())
}

fn init(matches: &ArgMatches) -> Result<()> {
    let path = config_path(matches)?;

    if path.exists() && !matches.get_flag("force") {
        let question = format!("{} already exists. Overwrite?", path.display());
        if !confirm(&question)? {
            println!("{}", "Keeping the existing config.".yellow());
            return Ok(());
        }
    }

    let config = DashboardConfig {
        agent_id: matches.get_one::<String>("agent-id").cloned(),
        ..Default::default()
    };
    config.save_to(&path)?;

    success(&format!("Wrote {}", path.display()));
    if config.agent_id.is_none() {
        dimmed("Set agent_id in the file or pass --agent-id when running the dashboard.");
    }
    Ok(())
}
