//! SQLite-backed device record store.
//!
//! One connection behind a mutex; every operation is a single statement, so
//! concurrent finalizations of the same device serialise and the last writer
//! wins. The database runs in WAL mode for crash safety.

use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::device::Device;
use crate::store::{DeviceStore, StoreError, StoreResult};

const DEVICE_COLUMNS: &str = "name, realm, public_key, public_key_fingerprint, display_name, \
                              image_rel_path, created_at, updated_at, deleted_at";

pub struct SqliteDeviceStore {
    conn: Mutex<Connection>,
}

impl SqliteDeviceStore {
    /// Create or open the device database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), "Opening device store");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Backend(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// Volatile database, for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                realm TEXT NOT NULL,
                public_key TEXT NOT NULL DEFAULT '',
                public_key_fingerprint TEXT NOT NULL DEFAULT '',
                display_name TEXT NOT NULL DEFAULT '',
                image_rel_path TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                deleted_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_devices_deleted_at ON devices(deleted_at);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))
    }

    fn row_to_device(row: &Row<'_>) -> rusqlite::Result<Device> {
        let created_at: i64 = row.get(6)?;
        let updated_at: i64 = row.get(7)?;
        let deleted_at: Option<i64> = row.get(8)?;

        let mut device = Device::provisioned(
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            created_at as u64,
        );
        device.bind_public_key(row.get::<_, String>(2)?, row.get::<_, String>(3)?);
        device.display_name = row.get(4)?;
        device.image_rel_path = row.get(5)?;
        device.updated_at = updated_at as u64;
        device.deleted_at = deleted_at.map(|t| t as u64);
        Ok(device)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl DeviceStore for SqliteDeviceStore {
    fn create(&self, device: &Device) -> StoreResult<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO devices (name, realm, public_key, public_key_fingerprint, display_name,
                                  image_rel_path, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                device.name,
                device.realm,
                device.public_key(),
                device.public_key_fingerprint(),
                device.display_name,
                device.image_rel_path,
                device.created_at as i64,
                device.updated_at as i64,
                device.deleted_at.map(|t| t as i64),
            ],
        );

        match result {
            Ok(_) => {
                debug!(name = %device.name, "Device row inserted");
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(StoreError::Duplicate {
                name: device.name.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Device> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM devices WHERE name = ?1 AND deleted_at IS NULL",
            DEVICE_COLUMNS
        );
        conn.query_row(&sql, params![name], Self::row_to_device)
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn update(&self, device: &Device) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE devices
             SET realm = ?2, public_key = ?3, public_key_fingerprint = ?4, display_name = ?5,
                 image_rel_path = ?6, updated_at = ?7
             WHERE name = ?1 AND deleted_at IS NULL",
            params![
                device.name,
                device.realm,
                device.public_key(),
                device.public_key_fingerprint(),
                device.display_name,
                device.image_rel_path,
                device.updated_at as i64,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                name: device.name.clone(),
            });
        }
        Ok(())
    }

    fn soft_delete(&self, name: &str, deleted_at: u64) -> StoreResult<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE devices SET deleted_at = ?2, updated_at = ?2
             WHERE name = ?1 AND deleted_at IS NULL",
            params![name, deleted_at as i64],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
