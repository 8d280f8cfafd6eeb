//! pixmill CLI - incremental batch screenshot transformation.
//!
//! pixmill turns trees of raw screenshots into mirrored trees of derived
//! artifacts (cropped, resized, re-encoded at fixed quality levels), then
//! sorts and audits what it produced.
//!
//! # Usage
//!
//! ```bash
//! # Process every pending file in every profile
//! pixmill process
//!
//! # Process one profile, or force specific files through it
//! pixmill process mine
//! pixmill process mine --files Zone1/shot.png
//!
//! # See what would be processed without touching anything
//! pixmill process --dry-run
//!
//! # Sort artifacts into destination trees, then audit
//! pixmill sort
//! pixmill verify
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// pixmill - incremental batch screenshot transformation pipeline.
#[derive(Parser, Debug)]
#[command(name = "pixmill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform pending source images into output artifacts
    Process(cli::process::ProcessArgs),

    /// Sort produced artifacts into the destination trees
    Sort(cli::sort::SortArgs),

    /// Audit the output tree for completeness and dimensions
    Verify(cli::verify::VerifyArgs),

    /// View configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match pixmill_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `pixmill config path`."
            );
            pixmill_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("pixmill v{}", pixmill_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Sort(args) => cli::sort::execute(args, config),
        Commands::Verify(args) => cli::verify::execute(args, config),
        Commands::Config(args) => cli::config::execute(args, config),
    }
}
