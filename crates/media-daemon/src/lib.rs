//! media-index command line library.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    format_result, format_status, index, init_logging, load_settings, lookup, reindex, search,
    status, Overrides,
};
