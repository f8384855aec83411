//! Save directory conventions
//!
//! A `SaveLayout` answers "what does save slot K look like on disk for this
//! identity". Everything host-game specific lives behind it.

use crate::archive::ComponentRename;
use crate::config::Settings;
use crate::paths::PATH_STEAM;
use crate::slots::pure::parse_slot_suffix;

use std::error::Error;
use std::path::{Path, PathBuf};

/// Strategy describing where and how a game keeps its save slots
pub trait SaveLayout: Send + Sync {
    /// Root holding one directory per identity
    fn saves_root(&self) -> &Path;

    fn identity_dir(&self, identity: &str) -> PathBuf {
        self.saves_root().join(identity)
    }

    fn slot_dir(&self, identity: &str, slot: u8) -> PathBuf;

    /// Slot number for a directory name inside the identity dir, if it is a slot at all
    fn parse_slot_dir(&self, name: &str) -> Option<u8>;

    fn is_occupied(&self, slot_dir: &Path) -> bool {
        slot_dir.is_dir()
    }

    /// Human readable name stored inside the save, if it has one
    fn read_display_name(&self, slot_dir: &Path) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;

    /// Path components rewritten when a slot travels through an archive
    fn archive_renames(&self, _identity: &str) -> Vec<ComponentRename> {
        Vec::new()
    }

    /// Best guess at the local identity, used on first run
    fn detect_identity(&self) -> Option<String> {
        None
    }
}

pub const SCHEDULE_ONE_APP_ID: u32 = 3164500;
pub const SAVE_DIR_PREFIX: &str = "SaveGame_";
pub const GAME_DATA_FILE: &str = "Game.json";
pub const ORGANISATION_FIELD: &str = "OrganisationName";
pub const LOCAL_PLAYER_DIR: &str = "Player_0";
pub const TEMP_PLAYER_DIR: &str = "TempPlayer";

/// Saves path relative to the Windows user profile
const SAVES_UNDER_LOCALLOW: &str = "TVGS/Schedule I/Saves";
/// Saves path inside a Proton prefix
const SAVES_UNDER_PFX: &str = "pfx/drive_c/users/steamuser/AppData/LocalLow/TVGS/Schedule I/Saves";

/// Schedule I layout: `<Saves>/<steamid>/SaveGame_<k>/Game.json`
#[derive(Clone, Debug)]
pub struct ScheduleOneLayout {
    saves_root: PathBuf,
}

impl ScheduleOneLayout {
    pub fn new(saves_root: PathBuf) -> Self {
        ScheduleOneLayout { saves_root }
    }

    /// Resolve the saves root from settings, the Windows profile or the Proton prefix
    pub fn locate(settings: &Settings) -> Self {
        let saves_root = settings
            .saves_root
            .clone()
            .unwrap_or_else(locate_saves_root);
        tracing::debug!("Using saves root {}", saves_root.display());
        Self::new(saves_root)
    }
}

fn locate_saves_root() -> PathBuf {
    // %APPDATA% points at AppData\Roaming, the game writes to AppData\LocalLow
    if cfg!(windows)
        && let Ok(appdata) = std::env::var("APPDATA")
        && let Some(appdata_dir) = Path::new(&appdata).parent()
    {
        return appdata_dir.join("LocalLow").join(SAVES_UNDER_LOCALLOW);
    }

    let compatdata = format!("steamapps/compatdata/{}", SCHEDULE_ONE_APP_ID);
    if let Ok(steam_dir) = steamlocate::SteamDir::locate()
        && let Ok(Some((_, library))) = steam_dir.find_app(SCHEDULE_ONE_APP_ID)
    {
        return library.path().join(&compatdata).join(SAVES_UNDER_PFX);
    }

    PATH_STEAM.join(&compatdata).join(SAVES_UNDER_PFX)
}

impl SaveLayout for ScheduleOneLayout {
    fn saves_root(&self) -> &Path {
        &self.saves_root
    }

    fn slot_dir(&self, identity: &str, slot: u8) -> PathBuf {
        self.identity_dir(identity)
            .join(format!("{}{}", SAVE_DIR_PREFIX, slot))
    }

    fn parse_slot_dir(&self, name: &str) -> Option<u8> {
        parse_slot_suffix(name, SAVE_DIR_PREFIX)
    }

    fn read_display_name(&self, slot_dir: &Path) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let contents = std::fs::read_to_string(slot_dir.join(GAME_DATA_FILE))?;
        let game: serde_json::Value = serde_json::from_str(&contents)?;
        Ok(game[ORGANISATION_FIELD]
            .as_str()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()))
    }

    fn archive_renames(&self, identity: &str) -> Vec<ComponentRename> {
        vec![ComponentRename::new(
            LOCAL_PLAYER_DIR,
            format!("Player_{}", identity),
        )]
    }

    fn detect_identity(&self) -> Option<String> {
        let entries = std::fs::read_dir(&self.saves_root).ok()?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name != TEMP_PLAYER_DIR)
            .collect();
        names.sort();
        names.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_dir_template() {
        let layout = ScheduleOneLayout::new(PathBuf::from("/saves"));
        assert_eq!(
            layout.slot_dir("76561198000000000", 3),
            PathBuf::from("/saves/76561198000000000/SaveGame_3")
        );
        assert_eq!(layout.parse_slot_dir("SaveGame_3"), Some(3));
        assert_eq!(layout.parse_slot_dir("Players"), None);
    }

    #[test]
    fn test_read_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ScheduleOneLayout::new(dir.path().to_path_buf());

        let named = dir.path().join("named");
        std::fs::create_dir_all(&named).unwrap();
        std::fs::write(
            named.join(GAME_DATA_FILE),
            r#"{"GameVersion":"0.3.3","OrganisationName":"Hyland Point Holdings"}"#,
        )
        .unwrap();
        assert_eq!(
            layout.read_display_name(&named).unwrap(),
            Some("Hyland Point Holdings".to_string())
        );

        let unnamed = dir.path().join("unnamed");
        std::fs::create_dir_all(&unnamed).unwrap();
        std::fs::write(unnamed.join(GAME_DATA_FILE), r#"{"OrganisationName":42}"#).unwrap();
        assert_eq!(layout.read_display_name(&unnamed).unwrap(), None);

        assert!(layout.read_display_name(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_player_dir_travels_under_identity() {
        let layout = ScheduleOneLayout::new(PathBuf::from("/saves"));
        assert_eq!(
            layout.archive_renames("765"),
            vec![ComponentRename::new("Player_0", "Player_765")]
        );
    }

    #[test]
    fn test_detect_identity_skips_temp_player() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ScheduleOneLayout::new(dir.path().to_path_buf());
        assert_eq!(layout.detect_identity(), None);

        std::fs::create_dir_all(dir.path().join(TEMP_PLAYER_DIR)).unwrap();
        std::fs::write(dir.path().join("0000.txt"), b"").unwrap();
        assert_eq!(layout.detect_identity(), None);

        std::fs::create_dir_all(dir.path().join("76561198000000001")).unwrap();
        std::fs::create_dir_all(dir.path().join("76561198000000000")).unwrap();
        assert_eq!(
            layout.detect_identity(),
            Some("76561198000000000".to_string())
        );
    }

    #[test]
    fn test_locate_prefers_settings_override() {
        let settings = Settings::from_lookup(|key| {
            (key == "SLOTSYNC_SAVES_ROOT").then(|| "/custom/Saves".to_string())
        });
        let layout = ScheduleOneLayout::locate(&settings);
        assert_eq!(layout.saves_root(), Path::new("/custom/Saves"));
    }
}
