use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Random hex suffix for scratch names next to a target path
pub fn scratch_suffix() -> String {
    format!("{:08x}", fastrand::u32(..))
}

/// Hidden sibling of `path` with the given tag, e.g. `.config.json.tmp-1a2b3c4d`
pub fn hidden_sibling(path: &Path, tag: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "slotsync".to_string());
    let sibling = format!(".{}.{}-{}", name, tag, scratch_suffix());
    match path.parent() {
        Some(parent) => parent.join(sibling),
        None => PathBuf::from(sibling),
    }
}

/// Write `bytes` to `path` through a temp file and a rename,
/// so readers see either the old contents or the new ones
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = hidden_sibling(path, "tmp");
    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Copy `src` onto `dest` through a temp file and a rename
pub fn copy_atomic(src: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = hidden_sibling(dest, "tmp");
    let result = (|| {
        std::fs::copy(src, &tmp)?;
        File::open(&tmp)?.sync_all()?;
        std::fs::rename(&tmp, dest)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Remove a file or directory, ignoring a missing path
pub fn remove_quietly(path: &Path) {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    if let Err(e) = result
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("Failed to remove {}: {}", path.display(), e);
    }
}

/// Open a directory in the platform file manager
pub fn open_path(path: &Path) -> std::io::Result<()> {
    let opener = if cfg!(windows) {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    Command::new(opener).arg(path).spawn()?;
    Ok(())
}
