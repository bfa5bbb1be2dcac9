//! SQLite-backed metadata store: users, storage objects, cell records.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("api key already registered")]
    ApiKeyTaken,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StorageRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub size_bytes: u64,
    pub cell_count: u64,
}

#[derive(Debug, Clone)]
pub struct CellRow {
    pub storage_id: i64,
    pub address: u64,
    pub path: String,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    api_key TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS storage (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users(id),
    name       TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    cell_count INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS cells (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    storage_id INTEGER NOT NULL REFERENCES storage(id),
    address    INTEGER NOT NULL,
    path       TEXT NOT NULL UNIQUE,
    UNIQUE (storage_id, address)
);
";

/// One connection behind a mutex. Statements are short and the write
/// volume is one row per accepted cell.
#[derive(Clone)]
pub struct MetaStore {
    conn: Arc<Mutex<Connection>>,
}

impl MetaStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ── Users ─────────────────────────────────────────────────────────────────

    pub fn create_user(&self, name: &str, api_key: &str) -> Result<i64, StoreError> {
        let conn = self.conn();
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM users WHERE api_key = ?1", params![api_key], |r| {
                r.get(0)
            })
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::ApiKeyTaken);
        }
        conn.execute(
            "INSERT INTO users (name, api_key) VALUES (?1, ?2)",
            params![name, api_key],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn user_by_api_key(&self, api_key: &str) -> Result<Option<UserRow>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, name FROM users WHERE api_key = ?1",
                params![api_key],
                |r| {
                    Ok(UserRow {
                        id: r.get(0)?,
                        name: r.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    // ── Storage objects ───────────────────────────────────────────────────────

    pub fn create_storage(
        &self,
        user_id: i64,
        name: &str,
        size_bytes: u64,
        cell_count: u64,
    ) -> Result<i64, StoreError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO storage (user_id, name, size_bytes, cell_count) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, name, size_bytes as i64, cell_count as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn storage_by_id(&self, id: i64) -> Result<Option<StorageRow>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, user_id, name, size_bytes, cell_count FROM storage WHERE id = ?1",
                params![id],
                |r| {
                    Ok(StorageRow {
                        id: r.get(0)?,
                        user_id: r.get(1)?,
                        name: r.get(2)?,
                        size_bytes: r.get::<_, i64>(3)? as u64,
                        cell_count: r.get::<_, i64>(4)? as u64,
                    })
                },
            )
            .optional()?)
    }

    pub fn list_storage(&self, user_id: i64) -> Result<Vec<StorageRow>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, size_bytes, cell_count FROM storage
             WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![user_id], |r| {
            Ok(StorageRow {
                id: r.get(0)?,
                user_id: r.get(1)?,
                name: r.get(2)?,
                size_bytes: r.get::<_, i64>(3)? as u64,
                cell_count: r.get::<_, i64>(4)? as u64,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Cells ─────────────────────────────────────────────────────────────────

    pub fn add_cell(&self, storage_id: i64, address: u64, path: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO cells (storage_id, address, path) VALUES (?1, ?2, ?3)",
            params![storage_id, address as i64, path],
        )?;
        Ok(())
    }

    pub fn cells_for(&self, storage_id: i64) -> Result<Vec<CellRow>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT storage_id, address, path FROM cells
             WHERE storage_id = ?1 ORDER BY address",
        )?;
        let rows = stmt.query_map(params![storage_id], |r| {
            Ok(CellRow {
                storage_id: r.get(0)?,
                address: r.get::<_, i64>(1)? as u64,
                path: r.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Looks a cell up by its locator path, returning the row and the
    /// id of the user owning its storage object.
    pub fn cell_owner(&self, path: &str) -> Result<Option<(CellRow, i64)>, StoreError> {
        Ok(self
            .conn()
            .query_row(
                "SELECT c.storage_id, c.address, c.path, s.user_id
                 FROM cells c JOIN storage s ON s.id = c.storage_id
                 WHERE c.path = ?1",
                params![path],
                |r| {
                    Ok((
                        CellRow {
                            storage_id: r.get(0)?,
                            address: r.get::<_, i64>(1)? as u64,
                            path: r.get(2)?,
                        },
                        r.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?)
    }
}
