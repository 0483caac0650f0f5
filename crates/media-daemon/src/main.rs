//! media-index
//!
//! Indexes a JSON media catalog into a local Tantivy index, resuming where a
//! previous run stopped, and answers lookups and searches.
//!
//! # Usage
//!
//! ```bash
//! media-index index [--catalog PATH] [--index-path PATH]
//! media-index reindex <ID>...
//! media-index lookup <ID>
//! media-index search <QUERY> [--limit N]
//! media-index status
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (platform config dir, or --config)
//! 3. Environment variables (MEDIA_*)
//! 4. CLI flags

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use media_daemon::{
    format_result, format_status, index, init_logging, load_settings, lookup, reindex, search,
    status, Cli, Commands, Overrides,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let overrides = Overrides {
        catalog: cli.catalog.clone(),
        index_path: cli.index_path.clone(),
        log_level: cli.log_level.clone(),
    };
    let settings = load_settings(cli.config.as_deref(), &overrides)?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Index => {
            let status = index(&settings).await?;
            println!(
                "Indexed {} items, marker {}",
                status.item_count,
                status.marker.as_deref().unwrap_or("(none)")
            );
        }
        Commands::Reindex { identifiers } => {
            let known = reindex(&settings, &identifiers).await?;
            println!("Reindexed {known} of {} identifiers", identifiers.len());
        }
        Commands::Lookup { identifier } => match lookup(&settings, &identifier)? {
            Some(item) => {
                let json = serde_json::to_string_pretty(&item).context("Failed to encode item")?;
                println!("{json}");
            }
            None => {
                println!("{identifier}: not found");
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Search { query, limit } => {
            for item in search(&settings, &query, limit).await? {
                println!("{}", format_result(&item));
            }
        }
        Commands::Status => {
            println!("{}", format_status(&status(&settings).await?));
        }
    }

    Ok(ExitCode::SUCCESS)
}
