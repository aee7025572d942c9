//! CloudDrive Database Layer
//!
//! Provides the SQLite-backed listing cache: one snapshot of entries per
//! listing screen, replaced wholesale on every successful fetch and read
//! back when the network is unavailable.

mod listing_cache;
mod schema;
mod pool;

pub use listing_cache::ListingCache;
pub use pool::{init_pool, DbPool};
pub use schema::migrate;

use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Get the database directory
pub fn db_dir() -> PathBuf {
    ProjectDirs::from("com", "CloudDrive", "CloudDrive")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Open the listing cache in the default data directory
pub fn init() -> Result<ListingCache> {
    init_at(&db_dir().join("cache.db"))
}

/// Open (creating if needed) the listing cache at `path`
pub fn init_at(path: &Path) -> Result<ListingCache> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = init_pool(path)?;
    migrate(&pool)?;

    tracing::info!("Listing cache initialized at {:?}", path);
    Ok(ListingCache::new(pool))
}
