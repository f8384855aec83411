//! Runtime settings read from the environment
//!
//! These never touch config.json; they describe where things live on this
//! machine and which object store backend to talk to.

use crate::config::types::DEFAULT_SLOT_COUNT;
use crate::paths::{PATH_CONFIG, PATH_SCRATCH};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub scratch_dir: PathBuf,
    /// Overrides the game's `Saves` directory
    pub saves_root: Option<PathBuf>,
    /// Use the filesystem-emulated store rooted here instead of GCS
    pub store_dir: Option<PathBuf>,
    pub gcs_endpoint: Option<String>,
    /// Static bearer token, skips the service account exchange
    pub gcs_token: Option<String>,
    pub timeout: Duration,
    pub slot_count: u8,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = get("SLOTSYNC_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let slot_count = get("SLOTSYNC_SLOT_COUNT")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SLOT_COUNT);

        Settings {
            config_dir: get("SLOTSYNC_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PATH_CONFIG.clone()),
            scratch_dir: PATH_SCRATCH.clone(),
            saves_root: get("SLOTSYNC_SAVES_ROOT").map(PathBuf::from),
            store_dir: get("SLOTSYNC_STORE_DIR").map(PathBuf::from),
            gcs_endpoint: get("SLOTSYNC_GCS_ENDPOINT"),
            gcs_token: get("SLOTSYNC_GCS_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
            slot_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let settings = settings_from(&[]);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(settings.slot_count, DEFAULT_SLOT_COUNT);
        assert!(settings.store_dir.is_none());
        assert!(settings.saves_root.is_none());
        assert!(settings.gcs_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("SLOTSYNC_CONFIG_DIR", "/tmp/cfg"),
            ("SLOTSYNC_STORE_DIR", "/tmp/store"),
            ("SLOTSYNC_TIMEOUT_SECS", "5"),
            ("SLOTSYNC_SLOT_COUNT", "3"),
            ("SLOTSYNC_GCS_ENDPOINT", "http://127.0.0.1:4443"),
        ]);
        assert_eq!(settings.config_dir, PathBuf::from("/tmp/cfg"));
        assert_eq!(settings.store_dir, Some(PathBuf::from("/tmp/store")));
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.slot_count, 3);
        assert_eq!(settings.gcs_endpoint.as_deref(), Some("http://127.0.0.1:4443"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let settings = settings_from(&[
            ("SLOTSYNC_TIMEOUT_SECS", "soon"),
            ("SLOTSYNC_SLOT_COUNT", "0"),
            ("SLOTSYNC_STORE_DIR", "   "),
        ]);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(settings.slot_count, DEFAULT_SLOT_COUNT);
        assert!(settings.store_dir.is_none());
    }
}
