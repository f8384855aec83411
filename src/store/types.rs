use crate::error::SyncResult;
use crate::util::scratch_suffix;
use std::path::{Path, PathBuf};

/// Remote object storage as seen by the orchestrator
///
/// Uploads replace the whole object; there are no partial or append writes.
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    fn list_buckets(&self) -> SyncResult<Vec<String>>;

    fn upload(&self, local_blob: &Path, bucket: &str, key: &str) -> SyncResult<()>;

    /// Fetch `key` into a fresh local file and return its path
    fn download(&self, bucket: &str, key: &str) -> SyncResult<PathBuf>;
}

/// Fresh path for a downloaded blob inside `dir`
pub fn download_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%m_%d-%M_%S");
    dir.join(format!("dl_{}_{}.zip", stamp, scratch_suffix()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_paths_are_distinct() {
        let dir = Path::new("/tmp/slotsync/downloads");
        let a = download_path(dir);
        let b = download_path(dir);
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir));
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("dl_") && name.ends_with(".zip"));
    }
}
