use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dreamclass_core::{code_from_link, Classroom, PushOutcome, SupabaseBackend};

mod app;
mod commands;
mod config;

use commands::{AskCommand, ConfigCommand, EventCommand, StudentCommand, SyncCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "dreamclass")]
#[command(version)]
#[command(about = "Manage one classroom: students, stickers and the school calendar", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Open the class from a share link before running the command
    #[arg(long, global = true, value_name = "URL")]
    link: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage students and their stickers
    Student(StudentCommand),

    /// Manage the school calendar
    Event(EventCommand),

    /// Show a summary of the class
    Dashboard,

    /// Share the class with other devices
    Sync(SyncCommand),

    /// Get class activity ideas for a topic
    Ask(AskCommand),

    /// Get a morning encouragement message
    Greet,

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreamclass=warn,dreamclass_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for config init
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return Ok(cmd.run(&config, cli_config_path)?),
        Some(Commands::Ask(cmd)) => return Ok(cmd.run(&config).await?),
        Some(Commands::Greet) => return Ok(commands::greet(&config).await?),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let mut classroom = app::open_classroom(&config)?;

    if let Some(link) = &cli.link {
        let code = code_from_link(link).ok_or_else(|| format!("No class code in link '{}'", link))?;
        if let Some(connection) = classroom.resume(Some(code)).await? {
            println!("Opened class {}", connection.code);
        }
    }

    if matches!(
        command,
        Commands::Student(_) | Commands::Event(_) | Commands::Dashboard
    ) {
        app::catch_up(&mut classroom).await;
    }

    match command {
        Commands::Student(cmd) => cmd.run(&mut classroom)?,
        Commands::Event(cmd) => cmd.run(&mut classroom)?,
        Commands::Dashboard => commands::dashboard::run(&classroom)?,
        Commands::Sync(cmd) => cmd.run(&mut classroom, &config).await?,
        Commands::Config(_) | Commands::Ask(_) | Commands::Greet => {}
    }

    settle(&mut classroom).await;
    Ok(())
}

/// Delivers a pending push before exiting. Local changes are already saved,
/// so a failure here is reported but does not fail the command.
async fn settle(classroom: &mut Classroom<SupabaseBackend>) {
    match classroom.settle().await {
        Ok(Some(PushOutcome::Pushed(_))) => println!("✓ synced"),
        Ok(_) => {}
        Err(e) => eprintln!("Warning: changes saved on this device but not synced: {}", e),
    }
}
