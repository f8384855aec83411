//! Filesystem-emulated object store
//!
//! `<root>/<bucket>/<key>`; buckets are the directories directly under root.

use crate::error::{SyncError, SyncResult};
use crate::store::types::{ObjectStore, download_path};
use crate::util::copy_atomic;

use std::path::{Component, Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    download_dir: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: PathBuf, download_dir: PathBuf) -> Self {
        FsObjectStore { root, download_dir }
    }

    fn bucket_path(&self, bucket: &str) -> SyncResult<PathBuf> {
        if bucket.is_empty() || !is_plain_relative(Path::new(bucket)) || bucket.contains('/') {
            return Err(SyncError::InvalidConfig(format!(
                "invalid bucket name '{}'",
                bucket
            )));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> SyncResult<PathBuf> {
        let bucket_path = self.bucket_path(bucket)?;
        if key.is_empty() || key.ends_with('/') || !is_plain_relative(Path::new(key)) {
            return Err(SyncError::InvalidConfig(format!("invalid object key '{}'", key)));
        }
        Ok(bucket_path.join(key))
    }
}

/// Only normal components, no `..`, no root
fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}

impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "fs"
    }

    fn list_buckets(&self) -> SyncResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| SyncError::Transport(format!("{}: {}", self.root.display(), e)))?;

        let mut buckets: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        buckets.sort();
        Ok(buckets)
    }

    fn upload(&self, local_blob: &Path, bucket: &str, key: &str) -> SyncResult<()> {
        let dest = self.object_path(bucket, key)?;
        if !local_blob.is_file() {
            return Err(SyncError::Upload(format!(
                "local blob missing: {}",
                local_blob.display()
            )));
        }
        if !self.root.join(bucket).is_dir() {
            return Err(SyncError::Upload(format!("bucket '{}' does not exist", bucket)));
        }

        copy_atomic(local_blob, &dest)
            .map_err(|e| SyncError::Upload(format!("{}: {}", dest.display(), e)))?;
        info!("Uploaded {} to fs://{}/{}", local_blob.display(), bucket, key);
        Ok(())
    }

    fn download(&self, bucket: &str, key: &str) -> SyncResult<PathBuf> {
        let src = self.object_path(bucket, key)?;
        if !src.is_file() {
            return Err(SyncError::NotFound(format!("fs://{}/{}", bucket, key)));
        }

        std::fs::create_dir_all(&self.download_dir).map_err(|e| {
            SyncError::Transport(format!("{}: {}", self.download_dir.display(), e))
        })?;
        let dest = download_path(&self.download_dir);
        std::fs::copy(&src, &dest)
            .map_err(|e| SyncError::Transport(format!("{}: {}", src.display(), e)))?;

        info!("Downloaded fs://{}/{} to {}", bucket, key, dest.display());
        Ok(dest)
    }
}
