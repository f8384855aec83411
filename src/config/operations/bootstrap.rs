use crate::config::operations::io::ConfigStore;
use crate::config::types::Config;
use crate::slots::SaveLayout;

use tracing::{info, warn};

/// Load the config at startup, creating it on the very first run
///
/// A first run seeds the identity from the save directory on disk. A config
/// file that exists but cannot be read is left untouched and defaults are
/// used in memory until the user saves an edit.
pub fn bootstrap_config(store: &mut ConfigStore, layout: &dyn SaveLayout) -> Config {
    if store.exists() {
        return store.load_or_default();
    }

    info!("No config at {}, creating one", store.path().display());
    // Unlocks saving; the file is known to be missing
    let _ = store.load();
    let mut config = Config::with_slot_count(store.slot_count());
    if let Some(identity) = layout.detect_identity() {
        info!("Detected steam id {}", identity);
        config.identity = identity;
    }
    if let Err(e) = store.save(&config) {
        warn!("{}", e);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::operations::io::CONFIG_FILE;
    use crate::slots::ScheduleOneLayout;

    #[test]
    fn test_first_run_detects_identity_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let saves = dir.path().join("Saves");
        std::fs::create_dir_all(saves.join("TempPlayer")).unwrap();
        std::fs::create_dir_all(saves.join("76561198000000000")).unwrap();
        let layout = ScheduleOneLayout::new(saves);

        let mut store = ConfigStore::in_dir(&dir.path().join("cfg"), 5);
        let config = bootstrap_config(&mut store, &layout);
        assert_eq!(config.identity, "76561198000000000");
        assert_eq!(config.selected_slot, 5);
        assert!(store.exists());

        let mut reread = ConfigStore::in_dir(&dir.path().join("cfg"), 5);
        assert_eq!(reread.load().unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "garbage").unwrap();
        let layout = ScheduleOneLayout::new(dir.path().join("Saves"));

        let mut store = ConfigStore::in_dir(dir.path(), 5);
        let config = bootstrap_config(&mut store, &layout);
        assert_eq!(config, Config::with_slot_count(5));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(),
            "garbage"
        );
    }
}
