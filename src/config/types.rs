use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Number of physical save slots in the reference deployment
pub const DEFAULT_SLOT_COUNT: u8 = 5;

/// Persisted user preferences
///
/// Field names on disk are fixed (`steamid`, `save_slot`, `bucket_name`,
/// `blob_name`); `save_slot` is stored 1-based.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Identity namespacing remote keys, usually a Steam64 ID
    #[serde(rename = "steamid")]
    pub identity: String,
    /// Active local slot in `[1, N]`, may point at an empty slot
    #[serde(rename = "save_slot")]
    pub selected_slot: u8,
    #[serde(rename = "bucket_name")]
    pub bucket: String,
    /// Object family inside the bucket
    #[serde(rename = "blob_name")]
    pub key_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_slot_count(DEFAULT_SLOT_COUNT)
    }
}

impl Config {
    /// Default record for a deployment with `slot_count` slots: last slot selected, everything else empty
    pub fn with_slot_count(slot_count: u8) -> Self {
        Config {
            identity: String::new(),
            selected_slot: slot_count.max(1),
            bucket: String::new(),
            key_prefix: String::new(),
        }
    }

    pub fn validate_slot(&self, slot_count: u8) -> SyncResult<()> {
        if self.selected_slot == 0 || self.selected_slot > slot_count {
            return Err(SyncError::InvalidConfig(format!(
                "save slot {} is outside 1..={}",
                self.selected_slot, slot_count
            )));
        }
        Ok(())
    }

    /// Check every field a remote operation depends on
    pub fn validate_for_sync(&self, slot_count: u8) -> SyncResult<()> {
        self.validate_slot(slot_count)?;
        check_path_component("steam id", &self.identity)?;
        if self.bucket.trim().is_empty() {
            return Err(SyncError::InvalidConfig("bucket name is not set".into()));
        }
        check_path_component("blob name", &self.key_prefix)
    }
}

/// Identity and prefix become single path components, both on disk and in keys
fn check_path_component(field: &str, value: &str) -> SyncResult<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidConfig(format!("{} is not set", field)));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(SyncError::InvalidConfig(format!(
            "{} '{}' must be a plain name without '/', '\\' or dot segments",
            field, value
        )));
    }
    Ok(())
}
