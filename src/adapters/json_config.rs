//! JSON configuration file adapter.
//!
//! Reads and writes a [`MachineConfig`] as pretty-printed JSON on disk.
//! File errors carry `anyhow` context for the log line, then collapse into
//! the port's [`ConfigError`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::MachineConfig;

#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading config file {}", self.path.display()))
    }

    fn write(&self, json: &str) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating config directory {}", dir.display()))?;
        }
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing config file {}", self.path.display()))
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == ErrorKind::NotFound)
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<MachineConfig, ConfigError> {
        let json = match self.read() {
            Ok(json) => json,
            Err(e) if is_not_found(&e) => return Err(ConfigError::NotFound),
            Err(e) => {
                warn!("JsonConfigFile: {:#}", e);
                return Err(ConfigError::IoError);
            }
        };
        let config: MachineConfig = serde_json::from_str(&json).map_err(|e| {
            warn!("JsonConfigFile: {} is not a valid config: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!("JsonConfigFile: loaded {}", self.path.display());
        Ok(config)
    }

    fn save(&self, config: &MachineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = config.to_json()?;
        self.write(&json).map_err(|e| {
            warn!("JsonConfigFile: {:#}", e);
            ConfigError::IoError
        })?;
        info!("JsonConfigFile: saved {}", self.path.display());
        Ok(())
    }
}
