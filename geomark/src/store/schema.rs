//! SQLite schema and forward migrations.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use super::StoreResult;

/// Schema version this build writes.
pub const SCHEMA_VERSION: i64 = 1;

/// Timestamp format stored in `created_at` columns (sortable as text).
pub(super) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Format a timestamp for storage.
pub(super) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp, accepting SQLite's `CURRENT_TIMESTAMP` form.
pub(super) fn parse_timestamp(text: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| {
            warn!(value = text, "Unparseable created_at, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
}

/// Bring the database up to [`SCHEMA_VERSION`]. Returns the version found before migrating.
pub(super) fn migrate(conn: &mut Connection) -> StoreResult<i64> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS database_info (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            version     INTEGER NOT NULL,
            created_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at  DATETIME DEFAULT CURRENT_TIMESTAMP
        );
        INSERT OR IGNORE INTO database_info (id, version) VALUES (1, 0);",
    )?;

    let current: i64 = conn
        .query_row("SELECT version FROM database_info WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?
        .unwrap_or(0);

    if current >= SCHEMA_VERSION {
        info!(version = current, "Database schema is up to date");
        return Ok(current);
    }

    info!(from = current, to = SCHEMA_VERSION, "Migrating database schema");
    let tx = conn.transaction()?;

    if current < 1 {
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS markers (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL,
                title       TEXT NOT NULL,
                description TEXT,
                color       TEXT,
                created_at  DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS marker_images (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                marker_id   INTEGER NOT NULL,
                uri         TEXT NOT NULL,
                created_at  DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (marker_id) REFERENCES markers (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_marker_images_marker_id ON marker_images(marker_id);",
        )?;
    }

    tx.execute(
        "UPDATE database_info SET version = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = 1",
        [SCHEMA_VERSION],
    )?;
    tx.commit()?;

    info!(version = SCHEMA_VERSION, "Database schema migrated");
    Ok(current)
}

/// Stored schema version.
pub(super) fn current_version(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("SELECT version FROM database_info WHERE id = 1", [], |row| {
        row.get(0)
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_migrate_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), 0);
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        assert_eq!(migrate(&mut conn).unwrap(), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('markers', 'marker_images')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)), ts);
    }

    #[test]
    fn test_parse_sqlite_default_timestamp() {
        let ts = parse_timestamp("2025-03-14 15:09:26");
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap());
    }

    #[test]
    fn test_parse_garbage_timestamp() {
        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::UNIX_EPOCH);
    }
}
