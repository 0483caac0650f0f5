//! CLI argument parsing for `media-index`.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Media library indexer
///
/// Indexes a JSON media catalog into a local search index and queries it.
#[derive(Parser, Debug)]
#[command(name = "media-index")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides the platform default)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the catalog path
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Override the index directory
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index whatever the stored progress marker says is missing
    Index,

    /// Reindex specific items by identifier
    Reindex {
        /// Identifiers to reindex
        #[arg(required = true)]
        identifiers: Vec<String>,
    },

    /// Print one item as JSON
    Lookup {
        /// Item identifier
        identifier: String,
    },

    /// Search item names and descriptions
    Search {
        /// Query text
        query: String,

        /// Maximum results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show item count, stored marker, and pending work
    Status,
}
