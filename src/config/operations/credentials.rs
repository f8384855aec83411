use crate::error::{SyncError, SyncResult};
use crate::store::ServiceAccountKey;
use crate::util::write_atomic;

use std::path::{Path, PathBuf};
use tracing::info;

pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Make sure a credentials.json exists in the config dir
///
/// A missing file is created as an empty service account template for the
/// user to fill in. An existing file is never modified.
pub fn ensure_credentials_template(config_dir: &Path) -> SyncResult<PathBuf> {
    let path = config_dir.join(CREDENTIALS_FILE);
    if path.exists() {
        return Ok(path);
    }

    let mut bytes = serde_json::to_vec_pretty(&ServiceAccountKey::default())
        .map_err(|e| SyncError::ConfigWrite(e.to_string()))?;
    bytes.push(b'\n');
    write_atomic(&path, &bytes)
        .map_err(|e| SyncError::ConfigWrite(format!("{}: {}", path.display(), e)))?;

    info!("Created credentials template at {}", path.display());
    Ok(path)
}
