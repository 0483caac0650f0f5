//! Command implementations.
//!
//! Each command opens the library from settings, does its work, and returns
//! a value for `main` to print.

use anyhow::{Context, Result};
use tracing::info;

use media_service::{load_catalog, LibraryConfig, LibraryStatus, MediaLibrary};
use media_types::{Item, Settings};

/// CLI values that override loaded settings.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub catalog: Option<String>,
    pub index_path: Option<String>,
    pub log_level: Option<String>,
}

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(config_path: Option<&str>, overrides: &Overrides) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(catalog) = &overrides.catalog {
        settings.catalog_path = catalog.clone();
    }
    if let Some(index_path) = &overrides.index_path {
        settings.index_path = index_path.clone();
    }
    if let Some(log_level) = &overrides.log_level {
        settings.log_level = log_level.clone();
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn open(settings: &Settings, reconcile_on_start: bool) -> Result<MediaLibrary> {
    let config = LibraryConfig::from(settings).with_reconcile_on_start(reconcile_on_start);
    MediaLibrary::open_with(settings, config).with_context(|| {
        format!(
            "Failed to open library (catalog {:?}, index {:?})",
            settings.catalog_path(),
            settings.index_path()
        )
    })
}

/// Reconcile, wait for indexing to finish, and report the final status.
pub async fn index(settings: &Settings) -> Result<LibraryStatus> {
    info!(catalog = ?settings.catalog_path(), "Indexing catalog");
    let library = open(settings, true)?;
    library.wait_for_startup().await;
    let status = library.status().await;
    library.shutdown();
    Ok(status)
}

/// Reindex identifiers; returns how many exist in the catalog.
pub async fn reindex(settings: &Settings, identifiers: &[String]) -> Result<usize> {
    let library = open(settings, false)?;
    let known = library
        .reindex_identifiers_and_wait(identifiers.iter().cloned())
        .await;
    library.shutdown();
    Ok(known)
}

/// Find one item. Reads only the catalog.
pub fn lookup(settings: &Settings, identifier: &str) -> Result<Option<Item>> {
    let store = load_catalog(settings)
        .with_context(|| format!("Failed to load catalog {:?}", settings.catalog_path()))?;
    Ok(store.find(identifier).cloned())
}

/// Run a query to completion; results are in display order.
pub async fn search(settings: &Settings, query: &str, limit: Option<usize>) -> Result<Vec<Item>> {
    let mut settings = settings.clone();
    if let Some(limit) = limit {
        settings.search_limit = limit;
    }

    let library = open(&settings, false)?;
    let items = library
        .search_session()
        .search(query)
        .completed()
        .await
        .unwrap_or_default();
    Ok(items)
}

/// Report progress without indexing.
pub async fn status(settings: &Settings) -> Result<LibraryStatus> {
    let library = open(settings, false)?;
    Ok(library.status().await)
}

/// One search result line: identifier, name, rating stars.
pub fn format_result(item: &Item) -> String {
    format!(
        "{}\t{}\t{}",
        item.identifier,
        item.name,
        item.rating_stars()
    )
}

/// Human-readable status block.
pub fn format_status(status: &LibraryStatus) -> String {
    format!(
        "Items:  {}\nMarker: {}\nPlan:   {}",
        status.item_count,
        status.marker.as_deref().unwrap_or("(none)"),
        status.plan
    )
}
