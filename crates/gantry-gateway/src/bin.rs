//! Gantry Gateway CLI application
//!
//! This module provides the command-line interface for the Gantry gateway.

use clap::{Parser, Subcommand};
use gantry_gateway::cli::commands;
use gantry_utils::config::Settings;

/// Command-line interface structure
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional path to a configuration file
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the CLI
#[derive(Subcommand)]
enum Commands {
    /// Start the Gantry gateway server
    Serve,
}

/// Main function to run the Gantry gateway application
///
/// This function initializes the application, parses command-line arguments,
/// and executes the appropriate command based on user input.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Settings::new(cli.config.clone()).expect("Failed to load configuration");

    // Initialize logger
    gantry_utils::logging::init_with_format(&config.log.level, &config.log.format)
        .expect("Failed to initialize logger");

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => commands::serve(&config).await?,
    }
    Ok(())
}
