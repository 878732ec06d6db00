//! Hearth CLI: the operator entry point.
//!
//! Commands:
//! - `validate`   Load and validate the profile document
//! - `resolve`    Print the effective configuration for a request context
//! - `transform`  Resolve a context and apply it to a draft reply
//! - `watch`      Keep a live store in sync with the document

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::context::ContextArgs;

#[derive(Parser)]
#[command(
    name = "hearth",
    about = "Hearth — household profile resolution for voice assistants",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile document (TOML, or JSON with a .json extension)
    #[arg(short, long, global = true, env = "HEARTH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the profile document
    Validate,

    /// Print the effective configuration for a request context
    Resolve {
        #[command(flatten)]
        context: ContextArgs,

        /// Print the merged settings fragment instead of the typed profile
        #[arg(long)]
        merged: bool,
    },

    /// Resolve a context and apply it to a draft reply
    Transform {
        #[command(flatten)]
        context: ContextArgs,

        /// Draft reply text
        #[arg(short, long)]
        text: String,
    },

    /// Watch the document and hot-reload it until Ctrl+C
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let path = cli
        .config
        .unwrap_or_else(hearth_config::default_config_path);

    match cli.command {
        Commands::Validate => commands::validate::run(&path)?,
        Commands::Resolve { context, merged } => commands::resolve::run(&path, &context, merged)?,
        Commands::Transform { context, text } => commands::transform::run(&path, &context, &text)?,
        Commands::Watch => commands::watch::run(&path).await?,
    }

    Ok(())
}
