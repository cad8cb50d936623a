//! Ordbok CLI — the main entry point.
//!
//! Commands:
//! - `init`    — Create the config file and empty tables
//! - `chat`    — Interactive dialog session in the terminal
//! - `status`  — Show table row counts

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ordbok",
    about = "Ordbok — a conversational Norwegian verb dictionary",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config file and empty tables
    Init,

    /// Chat with the dictionary in the terminal
    Chat {
        /// Caller identity to act as (defaults to "local-user")
        #[arg(short, long)]
        sender: Option<String>,

        /// Act as the privileged caller from the config
        #[arg(short, long)]
        admin: bool,
    },

    /// Show table row counts
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(ordbok_config::AppConfig::default_path);

    match cli.command {
        Commands::Init => commands::init::run(&config_path)?,
        Commands::Chat { sender, admin } => {
            commands::chat::run(&config_path, sender, admin).await?
        }
        Commands::Status => commands::status::run(&config_path).await?,
    }

    Ok(())
}
