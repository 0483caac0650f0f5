//! Configuration loading for media-index.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config dir>/media-index/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::MediaError;

/// Items per indexing batch.
pub const DEFAULT_BATCH_SIZE: usize = 6;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the JSON catalog
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the Tantivy index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Directory holding derived thumbnails
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: String,

    /// Items per indexing batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum hits per query
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Hits per partial result delivery
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn data_dir(child: &str) -> String {
    ProjectDirs::from("", "", "media-index")
        .map(|p| p.data_local_dir().join(child))
        .unwrap_or_else(|| PathBuf::from(".").join(child))
        .to_string_lossy()
        .to_string()
}

fn default_catalog_path() -> String {
    data_dir("catalog.json")
}

fn default_index_path() -> String {
    data_dir("index")
}

fn default_thumbnail_dir() -> String {
    data_dir("thumbnails")
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_search_limit() -> usize {
    100
}

fn default_search_page_size() -> usize {
    10
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            index_path: default_index_path(),
            thumbnail_dir: default_thumbnail_dir(),
            batch_size: default_batch_size(),
            search_limit: default_search_limit(),
            search_page_size: default_search_page_size(),
            writer_memory_mb: default_writer_memory_mb(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (MEDIA_*)
    ///
    /// CLI flags are applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, MediaError> {
        let config_dir = ProjectDirs::from("", "", "media-index")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("catalog_path", default_catalog_path())
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("index_path", default_index_path())
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("thumbnail_dir", default_thumbnail_dir())
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("batch_size", default_batch_size() as i64)
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("search_limit", default_search_limit() as i64)
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("search_page_size", default_search_page_size() as i64)
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| MediaError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| MediaError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // MEDIA_BATCH_SIZE, MEDIA_INDEX_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("MEDIA")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(|e| MediaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MediaError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the indexer cannot run with.
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.batch_size == 0 {
            return Err(MediaError::Config("batch_size must be > 0".to_string()));
        }
        if self.search_page_size == 0 {
            return Err(MediaError::Config(
                "search_page_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn catalog_path(&self) -> PathBuf {
        expand_home(&self.catalog_path)
    }

    pub fn index_path(&self) -> PathBuf {
        expand_home(&self.index_path)
    }

    pub fn thumbnail_dir(&self) -> PathBuf {
        expand_home(&self.thumbnail_dir)
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
