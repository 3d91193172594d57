//! Configuration view and validation commands: `taskflow config`.

use anyhow::Result;

use taskflow::config::{CONFIG_DIR, CONFIG_FILE, TaskflowConfig, TaskflowToml};

use super::super::ConfigCommands;

pub fn cmd_config(config: &TaskflowConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Taskflow Configuration");
            println!("======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No taskflow.toml found at {}", config_path.display());
                println!("Using default configuration.");
            }
            println!();

            let toml = &config.toml;
            println!("[backend]");
            println!(
                "  url = {}",
                toml.backend.url.as_deref().map(|u| format!("\"{}\"", u)).unwrap_or_else(|| "(unset)".into())
            );
            println!(
                "  anon_key = {}",
                if toml.backend.anon_key.is_some() { "(set)" } else { "(unset)" }
            );
            println!();
            println!("[auth]");
            println!("  email = {}", toml.auth.email.as_deref().unwrap_or("(unset)"));
            println!();
            println!("[server]");
            println!("  port = {}", toml.server.port);
            println!();
            println!("[log]");
            println!("  level = \"{}\"", toml.log.level);
            println!();

            println!("Effective values (with env/CLI overrides):");
            match config.backend() {
                Ok(backend) => println!("  backend url = \"{}\"", backend.url),
                Err(_) => println!("  backend url = (unset)"),
            }
            println!("  email = {}", config.email().as_deref().unwrap_or("(unset)"));
            println!("  log level = \"{}\"", config.log_level());
            println!(
                "  signed in = {}",
                matches!(config.load_session(), Ok(Some(_)))
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            let path = config.project_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if path.exists() {
                println!("taskflow.toml already exists at {}", path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            TaskflowToml::default().save(&path)?;

            println!("Created taskflow.toml at {}", path.display());
            println!();
            println!("You can now customize:");
            println!("  - [backend] url, anon_key");
            println!("  - [auth] email");
            println!("  - [server] port");
            println!();
        }
    }

    Ok(())
}
