//! Bucket-partitioned snapshot store for listings

use crate::{DbError, DbPool, Result};
use app_api::{EntryKind, FileEntry};
use rusqlite::Row;

const ENTRY_COLUMNS: &str =
    "name, path, size, created, kind, media_type, mime_type, file_url, preview_url, public_url";

/// Last successfully fetched listing per screen
#[derive(Clone)]
pub struct ListingCache {
    pool: DbPool,
}

impl ListingCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>> {
        self.pool.get().map_err(|e| DbError::Pool(e.to_string()))
    }

    /// Replace every entry stored under `bucket`.
    ///
    /// Delete and insert run in one transaction, so readers see either the
    /// old snapshot or the new one.
    pub fn replace_bucket(&self, bucket: &str, entries: &[FileEntry]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM cached_entries WHERE bucket = ?1", [bucket])?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO cached_entries (bucket, position, {})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                ENTRY_COLUMNS
            ))?;

            for (position, entry) in entries.iter().enumerate() {
                stmt.execute(rusqlite::params![
                    bucket,
                    position as i64,
                    entry.name,
                    entry.path,
                    entry.size.map(|s| s as i64),
                    entry.created,
                    entry.kind.as_str(),
                    entry.media_type,
                    entry.mime_type,
                    entry.file_url,
                    entry.preview_url,
                    entry.public_url,
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!(bucket, removed, stored = entries.len(), "Replaced cached listing");
        Ok(entries.len())
    }

    /// Entries stored under `bucket` in saved order
    pub fn bucket_entries(&self, bucket: &str) -> Result<Vec<FileEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cached_entries WHERE bucket = ?1 ORDER BY position, id",
            ENTRY_COLUMNS
        ))?;

        let rows = stmt.query_map([bucket], entry_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    /// Entries across every bucket, grouped by bucket
    pub fn all_entries(&self) -> Result<Vec<FileEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cached_entries ORDER BY bucket, position, id",
            ENTRY_COLUMNS
        ))?;

        let rows = stmt.query_map([], entry_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }

    /// Delete every cached entry
    pub fn clear(&self) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM cached_entries", [])?;
        tracing::info!(removed, "Listing cache cleared");
        Ok(removed)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<FileEntry> {
    let kind: String = row.get(4)?;
    let kind = kind.parse::<EntryKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(DbError::Corrupt(e)),
        )
    })?;

    let entry = FileEntry {
        name: row.get(0)?,
        path: row.get(1)?,
        size: row.get::<_, Option<i64>>(2)?.map(|s| s as u64),
        created: row.get(3)?,
        kind,
        media_type: row.get(5)?,
        mime_type: row.get(6)?,
        file_url: row.get(7)?,
        preview_url: row.get(8)?,
        public_url: row.get(9)?,
    };

    Ok(entry.normalized())
}
