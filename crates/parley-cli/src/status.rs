//! `parley status`: show configuration and provider status.

use anyhow::Result;
use colored::Colorize;

use parley_core::config::{get_config_path, load_config};
use parley_providers::registry::{match_provider, with_env_keys, PROVIDERS};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Parley Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        found_marker(config_path.exists())
    );

    let sessions_dir = config.sessions.dir_path();
    if config.sessions.persist {
        println!(
            "  {:<18} {} {}",
            "Sessions:".bold(),
            sessions_dir.display(),
            found_marker(sessions_dir.exists())
        );
    } else {
        println!("  {:<18} {}", "Sessions:".bold(), "in memory only".dimmed());
    }

    // Model, and which provider it would be sent to
    let providers_map = with_env_keys(&config.providers.to_map());
    let routed = match match_provider(&config.agent.model, &providers_map) {
        Some((_, spec)) => format!("via {}", spec.display_name).dimmed().to_string(),
        None => "(no configured provider)".red().to_string(),
    };
    println!("  {:<18} {} {}", "Model:".bold(), config.agent.model, routed);

    println!(
        "  {:<18} {} | {}",
        "Parameters:".bold(),
        format!("temp: {}", config.agent.temperature).dimmed(),
        format!("max_tokens: {}", config.agent.max_tokens).dimmed(),
    );

    println!();
    println!("  {}", "Providers:".bold());
    for spec in PROVIDERS {
        let status = match providers_map.get(spec.name) {
            Some(prov_config) if prov_config.is_configured() => {
                format!("{} (key set)", "✓".green())
            }
            _ => format!("{}", "· not configured".dimmed()),
        };
        println!("    {:<20} {}", spec.display_name, status);
    }

    println!();

    Ok(())
}

fn found_marker(exists: bool) -> String {
    if exists {
        "✓".green().to_string()
    } else {
        "(not found)".red().to_string()
    }
}
