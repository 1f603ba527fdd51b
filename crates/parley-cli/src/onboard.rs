//! `parley onboard`: initialize configuration and data directories.
//!
//! - Creates `~/.parley/config.json` with defaults
//! - Creates the sessions and REPL history directories

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use parley_core::config::{get_config_path, load_config, save_config, Config};
use parley_core::utils::get_data_path;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "Parley Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let config = write_default_config(&config_path)?;

    let sessions_dir = config.sessions.dir_path();
    ensure_dir(&sessions_dir, "sessions dir")?;
    ensure_dir(&get_data_path().join("history"), "history dir")?;

    println!();
    println!(
        "  Add an API key under {} in {}",
        "providers".bold(),
        config_path.display()
    );
    println!("  (or export GROQ_API_KEY / OPENAI_API_KEY / ...).");
    println!();
    println!(
        "{}",
        "  Setup complete! Run `parley chat` to start chatting.".green()
    );
    println!();

    Ok(())
}

/// Write the default config unless one already exists. Returns the config
/// that is now on disk.
fn write_default_config(path: &Path) -> Result<Config> {
    if path.exists() {
        println!("  {} config already exists at {}", "✓".green(), path.display());
        return Ok(load_config(Some(path)));
    }

    let config = Config::default();
    save_config(&config, Some(path))
        .with_context(|| format!("failed to write config: {}", path.display()))?;
    println!("  {} created config at {}", "✓".green(), path.display());
    Ok(config)
}

fn ensure_dir(path: &Path, label: &str) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create {label}: {}", path.display()))?;
    println!("  {} {label} at {}", "✓".green(), path.display());
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
