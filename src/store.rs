//! Object store gateway - whole-object uploads and downloads against a bucket
//!
//! ## Backends
//! - `GcsStore`: Google Cloud Storage JSON API, service account credentials
//! - `FsObjectStore`: buckets emulated as directories, for offline use and tests

mod fs;
mod gcs;
mod types;

use crate::config::{CREDENTIALS_FILE, Settings};
use crate::error::SyncResult;

pub use fs::FsObjectStore;
pub use gcs::{DEFAULT_GCS_ENDPOINT, GcsStore, ServiceAccountKey};
pub use types::ObjectStore;

/// Pick the backend described by the runtime settings
pub fn store_from_settings(settings: &Settings) -> SyncResult<Box<dyn ObjectStore>> {
    let download_dir = settings.scratch_dir.join("downloads");

    if let Some(root) = &settings.store_dir {
        tracing::info!("Using filesystem object store at {}", root.display());
        return Ok(Box::new(FsObjectStore::new(root.clone(), download_dir)));
    }

    let store = GcsStore::new(
        settings
            .gcs_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_GCS_ENDPOINT.to_string()),
        settings.config_dir.join(CREDENTIALS_FILE),
        settings.gcs_token.clone(),
        settings.timeout,
        download_dir,
    )?;
    Ok(Box::new(store))
}
