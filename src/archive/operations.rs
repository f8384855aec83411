// Atomic I/O operations for the archive codec

use crate::archive::pure::{ComponentRename, to_archive_name, to_local_path};
use crate::error::{SyncError, SyncResult};
use crate::util::{hidden_sibling, remove_quietly};

use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Packs directories into zip blobs inside a scratch directory, and unpacks
/// blobs over a destination directory
#[derive(Clone, Debug)]
pub struct ArchiveCodec {
    scratch_dir: PathBuf,
}

impl ArchiveCodec {
    pub fn new(scratch_dir: PathBuf) -> Self {
        ArchiveCodec { scratch_dir }
    }

    /// Pack `source` into `<scratch>/<label>.zip`
    pub fn pack(
        &self,
        source: &Path,
        label: &str,
        renames: &[ComponentRename],
    ) -> SyncResult<PathBuf> {
        if !source.is_dir() {
            return Err(SyncError::Pack(format!(
                "source directory does not exist: {}",
                source.display()
            )));
        }
        fs::create_dir_all(&self.scratch_dir).map_err(|e| {
            SyncError::Pack(format!("{}: {}", self.scratch_dir.display(), e))
        })?;

        let blob = self.scratch_dir.join(format!("{}.zip", label));
        info!("Packing {} -> {}", source.display(), blob.display());

        if let Err(e) = write_zip(source, &blob, renames) {
            remove_quietly(&blob);
            return Err(SyncError::Pack(format!("{}: {}", source.display(), e)));
        }
        Ok(blob)
    }

    /// Replace `dest` with the contents of `blob`
    ///
    /// Extraction goes to a hidden staging directory next to `dest` first.
    /// `dest` is only swapped out once the whole archive extracted cleanly,
    /// so a corrupt blob leaves the existing save untouched.
    pub fn unpack(&self, blob: &Path, dest: &Path, renames: &[ComponentRename]) -> SyncResult<()> {
        let Some(parent) = dest.parent() else {
            return Err(SyncError::Unpack(format!(
                "destination has no parent directory: {}",
                dest.display()
            )));
        };
        fs::create_dir_all(parent)
            .map_err(|e| SyncError::Unpack(format!("{}: {}", parent.display(), e)))?;

        let staging = hidden_sibling(dest, "incoming");
        info!("Unpacking {} -> {}", blob.display(), dest.display());

        if let Err(e) = extract_zip(blob, &staging, renames) {
            remove_quietly(&staging);
            return Err(SyncError::Unpack(format!("{}: {}", blob.display(), e)));
        }

        swap_into_place(&staging, dest)
    }
}

fn write_zip(source: &Path, blob: &Path, renames: &[ComponentRename]) -> Result<(), Box<dyn Error>> {
    let mut zip = ZipWriter::new(File::create(blob)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let walk = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walk {
        let entry = entry?;
        let rel = entry.path().strip_prefix(source)?;
        let name = to_archive_name(rel, renames);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options.clone())?;
        } else if entry.file_type().is_symlink() {
            // A blob without the link would not reproduce the tree
            return Err(format!("symlinks are not supported: {}", entry.path().display()).into());
        } else {
            #[allow(unused_mut)]
            let mut file_options = options.clone();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = entry.metadata()?.permissions().mode();
                file_options = file_options.unix_permissions(mode);
            }
            debug!("Adding {}", name);
            zip.start_file(name, file_options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish()?.sync_all()?;
    Ok(())
}

fn extract_zip(blob: &Path, dest: &Path, renames: &[ComponentRename]) -> Result<(), Box<dyn Error>> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(blob)?))?;
    fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(enclosed) = entry.enclosed_name() else {
            return Err(format!("unsafe entry name in archive: {}", entry.name()).into());
        };
        let rel = to_local_path(&enclosed, renames);
        if rel.as_os_str().is_empty() {
            continue;
        }
        let outpath = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;

        // Set permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o7777))?;
            }
        }
    }

    Ok(())
}

/// Rename `staging` over `dest`, keeping the old `dest` until the rename landed
fn swap_into_place(staging: &Path, dest: &Path) -> SyncResult<()> {
    let backup = if dest.exists() {
        let backup = hidden_sibling(dest, "previous");
        if let Err(e) = fs::rename(dest, &backup) {
            remove_quietly(staging);
            return Err(SyncError::Unpack(format!(
                "could not move {} aside: {}",
                dest.display(),
                e
            )));
        }
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(staging, dest) {
        if let Some(backup) = &backup
            && let Err(restore) = fs::rename(backup, dest)
        {
            warn!(
                "Could not restore {} from {}: {}",
                dest.display(),
                backup.display(),
                restore
            );
        }
        remove_quietly(staging);
        return Err(SyncError::Unpack(format!(
            "could not move unpacked save into {}: {}",
            dest.display(),
            e
        )));
    }

    if let Some(backup) = backup {
        remove_quietly(&backup);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Write;

    /// Relative path -> Some(contents) for files, None for directories
    fn snapshot(root: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap())
            .map(|e| {
                let rel = to_archive_name(e.path().strip_prefix(root).unwrap(), &[]);
                let contents = if e.file_type().is_dir() {
                    None
                } else {
                    Some(fs::read(e.path()).unwrap())
                };
                (rel, contents)
            })
            .collect()
    }

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("a.dat"), b"alpha").unwrap();
        fs::write(root.join("b/c.dat"), vec![0u8, 1, 2, 255, 254]).unwrap();
        fs::write(root.join("b/zero.dat"), b"").unwrap();
    }

    #[test]
    fn test_round_trip_reproduces_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("SaveGame_2");
        sample_tree(&source);

        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let blob = codec.pack(&source, "upl_test", &[]).unwrap();
        assert_eq!(blob, dir.path().join("scratch/upl_test.zip"));

        let dest = dir.path().join("restored/SaveGame_5");
        codec.unpack(&blob, &dest, &[]).unwrap();
        assert_eq!(snapshot(&source), snapshot(&dest));
    }

    #[test]
    fn test_round_trip_with_component_rename() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(source.join("Players/Player_0")).unwrap();
        fs::write(source.join("Players/Player_0/Inventory.json"), b"{}").unwrap();

        let renames = vec![ComponentRename::new("Player_0", "Player_42")];
        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let blob = codec.pack(&source, "upl", &renames).unwrap();

        let archive = ZipArchive::new(File::open(&blob).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"Players/Player_42/Inventory.json"));

        let dest = dir.path().join("dest");
        codec.unpack(&blob, &dest, &renames).unwrap();
        assert_eq!(snapshot(&source), snapshot(&dest));
    }

    #[test]
    fn test_pack_missing_source_is_pack_error() {
        let dir = tempfile::tempdir().unwrap();
        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let result = codec.pack(&dir.path().join("missing"), "upl", &[]);
        assert!(matches!(result, Err(SyncError::Pack(_))));
    }

    #[test]
    fn test_unpack_replaces_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);

        let dest = dir.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.dat"), b"old world").unwrap();
        fs::write(dest.join("a.dat"), b"old alpha").unwrap();

        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let blob = codec.pack(&source, "upl", &[]).unwrap();
        codec.unpack(&blob, &dest, &[]).unwrap();

        assert!(!dest.join("stale.dat").exists());
        assert_eq!(snapshot(&source), snapshot(&dest));

        // Only the destination remains, no staging or backup siblings
        let siblings: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with('.'))
            .collect();
        assert!(siblings.is_empty(), "leftovers: {:?}", siblings);
    }

    #[test]
    fn test_corrupt_blob_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("broken.zip");
        fs::write(&blob, b"this is not a zip archive").unwrap();

        let dest = dir.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("keep.dat"), b"precious").unwrap();

        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let result = codec.unpack(&blob, &dest, &[]);
        assert!(matches!(result, Err(SyncError::Unpack(_))));
        assert_eq!(fs::read(dest.join("keep.dat")).unwrap(), b"precious");
    }

    #[test]
    fn test_truncated_blob_is_unpack_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);
        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let blob = codec.pack(&source, "upl", &[]).unwrap();

        let bytes = fs::read(&blob).unwrap();
        fs::write(&blob, &bytes[..bytes.len() / 2]).unwrap();

        let result = codec.unpack(&blob, &dir.path().join("dest"), &[]);
        assert!(matches!(result, Err(SyncError::Unpack(_))));
        assert!(!dir.path().join("dest").exists());
    }

    #[test]
    fn test_unsafe_entry_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("evil.zip");
        {
            let mut zip = ZipWriter::new(File::create(&blob).unwrap());
            zip.start_file("../evil.txt", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"gotcha").unwrap();
            zip.finish().unwrap();
        }

        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let dest = dir.path().join("nested/dest");
        let result = codec.unpack(&blob, &dest, &[]);
        assert!(matches!(result, Err(SyncError::Unpack(_))));
        assert!(!dir.path().join("nested/evil.txt").exists());
        assert!(!dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_in_source_is_pack_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        sample_tree(&source);
        std::os::unix::fs::symlink("a.dat", source.join("link.dat")).unwrap();

        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let result = codec.pack(&source, "upl", &[]);
        match result {
            Err(SyncError::Pack(message)) => assert!(message.contains("link.dat"), "{}", message),
            other => panic!("expected a pack error, got {:?}", other),
        }
        assert!(!dir.path().join("scratch/upl.zip").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_survive_round_trip() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        let script = source.join("run.sh");
        fs::write(&script, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();

        let codec = ArchiveCodec::new(dir.path().join("scratch"));
        let blob = codec.pack(&source, "upl", &[]).unwrap();
        let dest = dir.path().join("dest");
        codec.unpack(&blob, &dest, &[]).unwrap();

        let mode = fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
