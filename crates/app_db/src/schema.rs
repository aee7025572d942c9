//! Database schema and migrations

use crate::{DbError, DbPool, Result};

const SCHEMA_VERSION: i32 = 1;

/// Run database migrations
pub fn migrate(pool: &DbPool) -> Result<()> {
    let conn = pool.get().map_err(|e| DbError::Pool(e.to_string()))?;

    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if current_version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database schema {} is newer than supported {}",
            current_version, SCHEMA_VERSION
        )));
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            "Migrating database from version {} to {}",
            current_version,
            SCHEMA_VERSION
        );

        if current_version < 1 {
            apply_v1(&conn)?;
        }

        conn.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
    }

    Ok(())
}

fn apply_v1(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per cached entry; a bucket is one listing screen
        CREATE TABLE IF NOT EXISTS cached_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bucket TEXT NOT NULL,

            -- Order inside the snapshot
            position INTEGER NOT NULL,

            name TEXT NOT NULL,
            path TEXT NOT NULL,
            size INTEGER,
            created TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL,
            media_type TEXT,
            mime_type TEXT,
            file_url TEXT,
            preview_url TEXT,
            public_url TEXT,

            cached_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- Path is deliberately not unique: a snapshot is replaced, never merged
        CREATE INDEX IF NOT EXISTS idx_cached_entries_bucket ON cached_entries(bucket, position);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_pool;
    use tempfile::NamedTempFile;

    #[test]
    fn test_migration() {
        let temp_file = NamedTempFile::new().unwrap();
        let pool = init_pool(temp_file.path()).unwrap();
        assert!(migrate(&pool).is_ok());

        // Idempotent
        assert!(migrate(&pool).is_ok());

        let conn = pool.get().unwrap();
        let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
