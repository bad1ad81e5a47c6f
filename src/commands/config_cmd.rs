use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::{CommandError, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# dreamclass configuration

# Where class data is kept (default: platform data dir + /dreamclass)
# data_dir: ~/.local/share/dreamclass

# Base URL used when printing share links
share_base_url: https://dreamclass.app/

# Remote store for sharing a class between devices.
# Credentials saved with 'dreamclass sync setup' take precedence.
# sync:
#   url: https://your-project.supabase.co
#   key: your-anon-key
#   debounce_ms: 1500

# Text generation for 'ask' and 'greet'
# assistant:
#   api_key: your-api-key
#   model: gemini-3-flash-preview
"#;

impl ConfigCommand {
    pub fn run(&self, config: &Config, config_path: Option<PathBuf>) -> Result<(), CommandError> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!("data_dir: {}", config.data_dir.value.display());
                        println!("  source: {}", config.data_dir.source);
                        println!();

                        println!("share_base_url: {}", config.share_base_url.value);
                        println!("  source: {}", config.share_base_url.source);
                        println!();

                        println!(
                            "sync.url: {}",
                            config.sync.url.as_deref().unwrap_or("(not set)")
                        );
                        println!(
                            "sync.key: {}",
                            if config.sync.key.is_some() { "(set)" } else { "(not set)" }
                        );
                        println!("sync.debounce_ms: {}", config.sync.debounce_ms);
                        println!();

                        println!(
                            "assistant.api_key: {}",
                            if config.assistant.api_key.is_some() {
                                "(set)"
                            } else {
                                "(not set)"
                            }
                        );
                        println!("assistant.model: {}", config.assistant.model);
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'dreamclass config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}
