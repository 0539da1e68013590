//! Configuration view and validation commands (`cwsim config`).

use anyhow::Result;
use std::path::Path;

use cwsim::sim_config::{ConfigSource, MODEL_ENV_VAR, SimConfig, SimToml};
use cwsim::tokens::format_token_count;

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(project_dir: &Path, cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| SimConfig::default_path(project_dir));

    match command {
        None | Some(ConfigCommands::Show) => {
            let config = super::load_config(project_dir, cli)?;

            println!();
            println!("cwsim Configuration");
            println!("===================");
            println!();

            match &config.source {
                ConfigSource::File(path) => println!("Config file: {}", path.display()),
                ConfigSource::Defaults => {
                    println!("No cwsim.toml found at {}", config_path.display());
                    println!("Using default configuration.");
                }
            }
            println!();

            print_toml(&config.toml);

            println!("Effective values (with env/CLI overrides):");
            println!("  model = \"{}\"", config.model_id());
            if let Ok(value) = std::env::var(MODEL_ENV_VAR) {
                println!("  ({} = \"{}\")", MODEL_ENV_VAR, value);
            }
            println!();

            if config.source == ConfigSource::Defaults {
                println!("Run 'cwsim config init' to create a cwsim.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No cwsim.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = SimToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
                println!();
                anyhow::bail!("{} problem(s) in {}", warnings.len(), config_path.display());
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("cwsim.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent)?;
            }

            let toml = SimToml::default();
            toml.save(&config_path)?;

            println!("Created cwsim.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [estimator] chars_per_token");
            println!("  - [thresholds] medium, high, critical");
            println!("  - [defaults] system_prompt, model");
            println!("  - [[models]] entries in the catalog");
            println!();
        }
    }

    Ok(())
}

fn print_toml(toml: &SimToml) {
    println!("[estimator]");
    println!("  chars_per_token = {}", toml.estimator.chars_per_token);
    println!();

    println!("[thresholds]");
    println!("  medium = {}", toml.thresholds.medium);
    println!("  high = {}", toml.thresholds.high);
    println!("  critical = {}", toml.thresholds.critical);
    println!();

    println!("[defaults]");
    println!("  system_prompt = \"{}\"", toml.defaults.system_prompt);
    println!("  model = \"{}\"", toml.defaults.model);
    println!();

    println!("[[models]]");
    for model in &toml.models {
        println!(
            "  {} = {} tokens ({})",
            model.id,
            format_token_count(model.context_window),
            model.name
        );
    }
    println!();
}
