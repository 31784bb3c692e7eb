use crate::core::config::CONFIG_KEYS;
use crate::core::Config;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("show", _)) => handle_show(),
        Some(("set", sub_matches)) => handle_set(sub_matches),
        Some(("reset", _)) => handle_reset(),
        Some(("path", _)) => {
            println!("{}", Config::get_config_path()?.display());
            Ok(())
        }
        _ => {
            println!("Use 'rmon config --help' for more information.");
            Ok(())
        }
    }
}

fn handle_show() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Monitor settings:".white().bold());
    for key in CONFIG_KEYS {
        let value = config.get_value(key).unwrap_or_default();
        println!("  {:<26} {}", key, value.cyan());
    }

    if let Err(e) = config.validate() {
        println!(
            "{}",
            format!("⚠️  Warning: stored config is invalid: {}", e).yellow()
        );
    }
    Ok(())
}

fn handle_set(matches: &clap::ArgMatches) -> Result<()> {
    let key = matches
        .get_one::<String>("key")
        .context("Key argument is required")?;
    let value = matches
        .get_one::<String>("value")
        .context("Value argument is required")?;

    let mut config = Config::load()?;
    config
        .set_value(key, value)
        .with_context(|| format!("Cannot set {}", key))?;
    config.save()?;

    println!("{}", format!("✓ {} set to {}", key, value).green().bold());
    Ok(())
}

fn handle_reset() -> Result<()> {
    Config::default().save()?;
    println!("{}", "✓ Settings reset to defaults".green().bold());
    Ok(())
}
