//! Fieldsort CLI - sorts field photographs by the specimen code card
//! photographed before them.
//!
//! Each specimen is photographed after a card carrying its QR code. Fieldsort
//! reads the cards, attributes every following photo to the most recent
//! card, and renames or copies the batch accordingly.
//!
//! # Usage
//!
//! ```bash
//! # See what would happen
//! fieldsort sort ./dcim/
//!
//! # Copy into per-specimen folders and write a summary
//! fieldsort sort ./dcim/ --copy -t "sorted/{ID}/{FN}.{EXT}" -o specimens.tsv
//!
//! # View configuration
//! fieldsort config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Fieldsort - sort field photographs into specimen groups by QR code card.
#[derive(Parser, Debug)]
#[command(name = "fieldsort")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "FIELDSORT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify, group, and relocate photos
    Sort(cli::sort::SortArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => fieldsort_core::Config::load_from(path).map_err(|e| {
            anyhow::anyhow!("Failed to load config {}: {e}", path.display())
        })?,
        None => match fieldsort_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `fieldsort config path`."
                );
                fieldsort_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("fieldsort v{}", fieldsort_core::VERSION);

    match cli.command {
        Commands::Sort(args) => cli::sort::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
