//! Entry name mapping
//!
//! Archive entries always use `/` separators. A `ComponentRename` swaps a
//! whole path component, e.g. the local `Player_0` directory travels as
//! `Player_<steamid>` so peers can tell whose player data it is.

use std::path::{Component, Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentRename {
    pub local: String,
    pub archived: String,
}

impl ComponentRename {
    pub fn new(local: impl Into<String>, archived: impl Into<String>) -> Self {
        ComponentRename {
            local: local.into(),
            archived: archived.into(),
        }
    }
}

/// Archive entry name for a path relative to the packed directory
pub fn to_archive_name(rel: &Path, renames: &[ComponentRename]) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .map(|part| {
            renames
                .iter()
                .find(|r| r.local == part)
                .map(|r| r.archived.clone())
                .unwrap_or(part)
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Local relative path for an (already sanitized) archive entry path
pub fn to_local_path(enclosed: &Path, renames: &[ComponentRename]) -> PathBuf {
    enclosed
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .map(|part| {
            renames
                .iter()
                .find(|r| r.archived == part)
                .map(|r| r.local.clone())
                .unwrap_or(part)
        })
        .collect()
}
