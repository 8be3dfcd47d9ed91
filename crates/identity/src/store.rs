//! Device record store contract.
//!
//! The store exclusively owns persisted device state; everything else works
//! on request-scoped copies. Lookups must tell "no such device" apart from any
//! other failure so the boundary can answer 404 rather than 500. Logically
//! deleted records stay in the store but are invisible to `find_by_name` and
//! `update`.

use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use crate::device::Device;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No device named {name}")]
    NotFound { name: String },

    #[error("Device {name} already exists")]
    Duplicate { name: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed create/lookup/update of device records by unique name.
///
/// Implementations serialise conflicting writes to the same name; when two
/// updates race, the last one to commit wins.
pub trait DeviceStore: Send + Sync {
    fn create(&self, device: &Device) -> StoreResult<()>;

    fn find_by_name(&self, name: &str) -> StoreResult<Device>;

    fn update(&self, device: &Device) -> StoreResult<()>;

    /// Mark a record deleted at `deleted_at` without removing it.
    fn soft_delete(&self, name: &str, deleted_at: u64) -> StoreResult<()>;
}

/// In-process store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryDeviceStore {
    devices: RwLock<HashMap<String, Device>>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, including logically deleted ones.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.devices.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("device map lock poisoned".to_string())
}

impl DeviceStore for MemoryDeviceStore {
    fn create(&self, device: &Device) -> StoreResult<()> {
        let mut devices = self.devices.write().map_err(poisoned)?;
        if devices.contains_key(&device.name) {
            return Err(StoreError::Duplicate {
                name: device.name.clone(),
            });
        }
        devices.insert(device.name.clone(), device.clone());
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Device> {
        let devices = self.devices.read().map_err(poisoned)?;
        devices
            .get(name)
            .filter(|d| !d.is_deleted())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    fn update(&self, device: &Device) -> StoreResult<()> {
        let mut devices = self.devices.write().map_err(poisoned)?;
        match devices.get_mut(&device.name) {
            Some(existing) if !existing.is_deleted() => {
                *existing = device.clone();
                Ok(())
            }
            _ => Err(StoreError::NotFound {
                name: device.name.clone(),
            }),
        }
    }

    fn soft_delete(&self, name: &str, deleted_at: u64) -> StoreResult<()> {
        let mut devices = self.devices.write().map_err(poisoned)?;
        match devices.get_mut(name) {
            Some(existing) if !existing.is_deleted() => {
                existing.deleted_at = Some(deleted_at);
                existing.updated_at = deleted_at;
                Ok(())
            }
            _ => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
        }
    }
}
