//! In-memory configuration store.
//!
//! Holds the configuration as a postcard blob, the same way a key/value
//! flash namespace would.  Used by tests and by hosts without storage.

use std::cell::RefCell;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::MachineConfig;

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blob: RefCell<Option<Vec<u8>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw bytes (simulates a previously written blob).
    pub fn with_blob(bytes: Vec<u8>) -> Self {
        Self {
            blob: RefCell::new(Some(bytes)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blob.borrow().is_none()
    }

    pub fn clear(&self) {
        self.blob.borrow_mut().take();
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<MachineConfig, ConfigError> {
        let blob = self.blob.borrow();
        let Some(bytes) = blob.as_deref() else {
            return Err(ConfigError::NotFound);
        };
        let config: MachineConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        info!("MemoryConfigStore: loaded {} bytes", bytes.len());
        Ok(config)
    }

    fn save(&self, config: &MachineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        info!("MemoryConfigStore: saved {} bytes", bytes.len());
        *self.blob.borrow_mut() = Some(bytes);
        Ok(())
    }
}
