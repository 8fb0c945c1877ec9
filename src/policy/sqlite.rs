//! SQLite-backed policy store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::platform::Platform;
use crate::policy::entry::PolicyEntry;
use crate::policy::error::StoreError;
use crate::policy::store::PolicyStore;
use crate::version::AppVersion;

/// Policy table persisted in SQLite, one row per (platform, version).
///
/// The numeric major/minor/patch columns are derived from the version
/// string on every write and exist purely so reads can be ordered
/// newest-version-first in SQL.
pub struct SqlitePolicyStore {
    conn: Mutex<Connection>,
}

impl SqlitePolicyStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening policy database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // WAL allows concurrent readers while a write is in flight
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        Ok(store)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        debug!("Creating policy schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS app_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                platform TEXT NOT NULL,
                version TEXT NOT NULL,
                major INTEGER NOT NULL,
                minor INTEGER NOT NULL,
                patch INTEGER NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 0,
                expire_at TEXT,
                UNIQUE(platform, version)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_app_versions_platform ON app_versions(platform)",
            [],
        )?;

        Ok(())
    }

    /// Insert or update the row for `(entry.platform, entry.version)`.
    ///
    /// The ordering columns are derived from the parsed version; callers
    /// never supply them.
    pub fn upsert(&self, entry: &PolicyEntry) -> Result<(), StoreError> {
        debug!(
            "Saving policy row {}/{}",
            entry.platform.as_str(),
            entry.version
        );

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO app_versions (platform, version, major, minor, patch, enabled, expire_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(platform, version) DO UPDATE SET
                major = excluded.major,
                minor = excluded.minor,
                patch = excluded.patch,
                enabled = excluded.enabled,
                expire_at = excluded.expire_at
            "#,
            (
                entry.platform.as_str(),
                entry.version.to_string(),
                entry.version.major(),
                entry.version.minor(),
                entry.version.patch(),
                entry.enabled,
                entry.expire_at.map(|at| at.to_rfc3339()),
            ),
        )?;

        Ok(())
    }

    /// Delete the row for (platform, version). Returns whether a row existed.
    pub fn remove(&self, platform: Platform, version: &AppVersion) -> Result<bool, StoreError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM app_versions WHERE platform = ?1 AND version = ?2",
            (platform.as_str(), version.to_string()),
        )?;

        Ok(removed > 0)
    }

    /// Every stored row, grouped by platform, newest version first.
    pub fn list(&self) -> Result<Vec<PolicyEntry>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT platform, version, enabled, expire_at FROM app_versions
            ORDER BY platform, major DESC, minor DESC, patch DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], row_fields)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

impl PolicyStore for SqlitePolicyStore {
    fn current_entries(&self, platform: Platform) -> Result<Vec<PolicyEntry>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT platform, version, enabled, expire_at FROM app_versions
            WHERE platform = ?1
            ORDER BY major DESC, minor DESC, patch DESC
            "#,
        )?;

        let rows = stmt
            .query_map([platform.as_str()], row_fields)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

type RawRow = (String, String, bool, Option<String>);

fn row_fields(row: &rusqlite::Row<'_>) -> Result<RawRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn entry_from_row((platform, version, enabled, expire_at): RawRow) -> Result<PolicyEntry, StoreError> {
    let platform = match platform.parse::<Platform>() {
        Ok(platform) => platform,
        Err(()) => return Err(StoreError::UnknownPlatform(platform)),
    };
    let version = version.parse()?;
    let expire_at = expire_at
        .map(|raw| DateTime::parse_from_rfc3339(&raw).map(|at| at.with_timezone(&Utc)))
        .transpose()?;

    Ok(PolicyEntry {
        platform,
        version,
        enabled,
        expire_at,
    })
}
