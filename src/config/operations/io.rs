use crate::config::settings::Settings;
use crate::config::types::Config;
use crate::error::{SyncError, SyncResult};
use crate::util::write_atomic;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "config.json";

/// Reads and writes config.json
///
/// `save` refuses to run until `load` has been attempted once, so in-memory
/// defaults never clobber a persisted config that was not read yet.
pub struct ConfigStore {
    path: PathBuf,
    slot_count: u8,
    loaded: bool,
}

impl ConfigStore {
    pub fn new(path: PathBuf, slot_count: u8) -> Self {
        ConfigStore {
            path,
            slot_count,
            loaded: false,
        }
    }

    pub fn in_dir(dir: &Path, slot_count: u8) -> Self {
        Self::new(dir.join(CONFIG_FILE), slot_count)
    }

    /// config.json in the configured user config directory
    pub fn default_location(settings: &Settings) -> Self {
        Self::in_dir(&settings.config_dir, settings.slot_count)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slot_count(&self) -> u8 {
        self.slot_count
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&mut self) -> SyncResult<Config> {
        self.loaded = true;

        let file = File::open(&self.path).map_err(|e| {
            SyncError::ConfigUnreadable(format!("{}: {}", self.path.display(), e))
        })?;
        let config: Config = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            SyncError::ConfigUnreadable(format!("{}: {}", self.path.display(), e))
        })?;
        config
            .validate_slot(self.slot_count)
            .map_err(|e| SyncError::ConfigUnreadable(e.to_string()))?;

        info!("Loaded config from {}", self.path.display());
        Ok(config)
    }

    /// Load, falling back to the documented default when the file is missing or malformed
    pub fn load_or_default(&mut self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Config::with_slot_count(self.slot_count)
            }
        }
    }

    pub fn save(&self, config: &Config) -> SyncResult<()> {
        if !self.loaded {
            return Err(SyncError::ConfigWrite(
                "config has not been loaded yet, refusing to overwrite it".into(),
            ));
        }
        config
            .validate_slot(self.slot_count)
            .map_err(|e| SyncError::ConfigWrite(e.to_string()))?;

        let mut bytes = serde_json::to_vec_pretty(config)
            .map_err(|e| SyncError::ConfigWrite(e.to_string()))?;
        bytes.push(b'\n');

        write_atomic(&self.path, &bytes)
            .map_err(|e| SyncError::ConfigWrite(format!("{}: {}", self.path.display(), e)))?;

        info!("Wrote config to {}", self.path.display());
        Ok(())
    }
}
