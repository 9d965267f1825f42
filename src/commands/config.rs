use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::Config;

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(config, OutputFormat::resolve(format)),
    }
}

fn show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(config)?),
        OutputFormat::Text => {
            println!("{}", "Effective configuration:".bold());
            println!();
            print!("{}", serde_yaml::to_string(config)?);
            println!();
            println!(
                "{}",
                "Env overrides: WARDEN_DISABLE_GUARD, WARDEN_DISABLE_INJECT, WARDEN_DISABLE_FORMAT, WARDEN_DISABLE_SESSION, WARDEN_DEBUG".dimmed()
            );
        }
    }
    Ok(())
}
