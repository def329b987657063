//! Configuration inspection commands

use anyhow::Result;
use colored::Colorize;
use docaudit_conversation::{StyleGuideLibrary, DEFAULT_STYLE_GUIDES};
use docaudit_core::AppConfig;

use crate::output;
use crate::ConfigCommands;

pub fn run(config: &AppConfig, cmd: &ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Guides => list_guides(config),
    }
}

fn redact(secret: &str) -> String {
    if secret.is_empty() {
        "[unset]".to_string()
    } else {
        "[set]".to_string()
    }
}

fn show_config(config: &AppConfig) -> Result<()> {
    let mut shown = config.clone();
    shown.inference.api_key = redact(&config.inference.api_key);
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn list_guides(config: &AppConfig) -> Result<()> {
    let library = StyleGuideLibrary::new(&config.ingestion.style_guide_dir);
    output::key_value("Style guide directory", &library.dir().display().to_string());
    println!();

    let mut missing = 0;
    for name in DEFAULT_STYLE_GUIDES {
        if library.path_for(name).is_file() {
            println!("  {} {}", "✓".green(), name);
        } else {
            missing += 1;
            println!("  {} {}", "✗".red(), name.dimmed());
        }
    }

    if missing > 0 {
        println!();
        output::warning(&format!("{} style guides are missing", missing));
    }
    Ok(())
}
