//! SQLite connection pool

use crate::{DbError, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

/// One writer replacing a snapshot plus a few concurrent offline reads
const MAX_CONNECTIONS: u32 = 4;

const CONNECTION_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA busy_timeout = 5000;
    PRAGMA temp_store = MEMORY;
";

/// Open a pool on the cache database at `path`
pub fn init_pool(path: &Path) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    Pool::builder()
        .max_size(MAX_CONNECTIONS)
        .min_idle(Some(1))
        .build(manager)
        .map_err(|e| DbError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_connections_use_wal() {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = init_pool(temp_file.path()).unwrap();

        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(pool.max_size(), MAX_CONNECTIONS);
    }
}
