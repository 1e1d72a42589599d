//! Tarball extraction
//!
//! Entries are validated before anything touches the disk: absolute paths and
//! paths that climb out of the destination fail the whole extraction.

use burr_core::error::BurrError;
use burr_core::utils::path::{is_safe_path, safe_join, strip_components};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::debug;

use crate::InstallResult;

/// npm packs everything under a single `package/` directory
pub const NPM_WRAPPER_DEPTH: usize = 1;

fn io_error(context: &str, path: &Path, source: std::io::Error) -> BurrError {
    BurrError::io(format!("{} {}", context, path.display()), source)
}

/// Extract a gzipped tarball into `dest_dir`, dropping `strip` leading components
pub fn extract_tarball<R: Read>(reader: R, dest_dir: &Path, strip: usize) -> InstallResult<()> {
    let mut archive = Archive::new(GzDecoder::new(reader));

    fs::create_dir_all(dest_dir).map_err(|e| io_error("Failed to create", dest_dir, e))?;

    let entries = archive
        .entries()
        .map_err(|e| io_error("Failed to read archive for", dest_dir, e))?;

    for entry_result in entries {
        let mut entry =
            entry_result.map_err(|e| io_error("Failed to read archive entry for", dest_dir, e))?;

        let entry_path = entry
            .path()
            .map_err(|e| io_error("Invalid entry path in archive for", dest_dir, e))?
            .into_owned();
        let Some(relative) = validate_extract_path(&entry_path, strip)? else {
            continue;
        };
        let target = safe_join(dest_dir, &relative)?;

        match entry.header().entry_type() {
            EntryType::Regular | EntryType::Continuous => {
                extract_regular_file(&mut entry, &target)?;

                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    if let Ok(mode) = entry.header().mode() {
                        // owner must keep read/write access
                        let permissions = fs::Permissions::from_mode(mode | 0o600);
                        let _ = fs::set_permissions(&target, permissions);
                    }
                }
            },
            EntryType::Directory => {
                fs::create_dir_all(&target).map_err(|e| io_error("Failed to create", &target, e))?;
            },
            EntryType::Symlink => extract_symlink(&mut entry, &relative, &target)?,
            other => {
                debug!(path = %entry_path.display(), "skipping {:?} entry", other);
            },
        }
    }

    Ok(())
}

/// Check an entry path and strip the wrapper directory
///
/// `Ok(None)` means the entry is the wrapper itself (or a pax header) and has
/// nothing to extract.
fn validate_extract_path(entry_path: &Path, strip: usize) -> InstallResult<Option<PathBuf>> {
    if !is_safe_path(entry_path) {
        return Err(BurrError::UnsafeArchivePath {
            path: entry_path.display().to_string(),
        });
    }
    Ok(strip_components(entry_path, strip))
}

/// Extract a regular file from a tar entry
fn extract_regular_file<R: Read>(entry: &mut tar::Entry<R>, dest_path: &Path) -> InstallResult<()> {
    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("Failed to create", parent, e))?;
    }

    let mut file = fs::File::create(dest_path).map_err(|e| io_error("Failed to create", dest_path, e))?;
    std::io::copy(entry, &mut file).map_err(|e| io_error("Failed to write", dest_path, e))?;

    Ok(())
}

/// Extract a symlink whose target stays inside the package
fn extract_symlink<R: Read>(
    entry: &mut tar::Entry<R>,
    relative: &Path,
    dest_path: &Path,
) -> InstallResult<()> {
    let link_target = entry
        .link_name()
        .map_err(|e| io_error("Invalid symlink in archive at", dest_path, e))?;
    let Some(link_target) = link_target else {
        return Ok(());
    };

    let resolved = relative
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(&link_target);
    if link_target.is_absolute() || !is_safe_path(&resolved) {
        return Err(BurrError::UnsafeArchivePath {
            path: format!("{} -> {}", relative.display(), link_target.display()),
        });
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("Failed to create", parent, e))?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&link_target, dest_path)
            .map_err(|e| io_error("Failed to link", dest_path, e))?;
    }
    #[cfg(not(unix))]
    {
        debug!(path = %dest_path.display(), "symlinks are not extracted on this platform");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;
    use tempfile::tempdir;

    fn file_header(path: &str, size: usize) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_path(path).unwrap();
        header.set_size(size as u64);
        header.set_mode(0o644);
        header.set_cksum();
        header
    }

    /// Header whose name is written raw so `..` survives
    fn raw_header(path: &str, size: usize) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        let name = &mut header.as_old_mut().name;
        name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_size(size as u64);
        header.set_mode(0o644);
        header.set_cksum();
        header
    }

    fn tarball(entries: Vec<(tar::Header, &[u8])>) -> Vec<u8> {
        let mut data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut data, Compression::default());
            let mut builder = Builder::new(encoder);
            for (header, body) in entries {
                builder.append(&header, body).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }
        data
    }

    #[test]
    fn test_extract_strips_wrapper_directory() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("left");

        let data = tarball(vec![
            (file_header("package/package.json", 2), "{}".as_bytes()),
            (file_header("package/lib/index.js", 11), "hello world".as_bytes()),
        ]);
        extract_tarball(std::io::Cursor::new(data), &dest, NPM_WRAPPER_DEPTH).unwrap();

        assert_eq!(fs::read_to_string(dest.join("package.json")).unwrap(), "{}");
        assert_eq!(fs::read_to_string(dest.join("lib/index.js")).unwrap(), "hello world");
        assert!(!dest.join("package").exists());
    }

    #[test]
    fn test_extract_without_strip() {
        let temp_dir = tempdir().unwrap();
        let data = tarball(vec![(file_header("test.txt", 5), "hello".as_bytes())]);

        extract_tarball(std::io::Cursor::new(data), temp_dir.path(), 0).unwrap();
        assert_eq!(fs::read_to_string(temp_dir.path().join("test.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_directory_traversal_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let dest = temp_dir.path().join("nested").join("left");

        let data = tarball(vec![(raw_header("package/../../evil.js", 4), "evil".as_bytes())]);
        let result = extract_tarball(std::io::Cursor::new(data), &dest, NPM_WRAPPER_DEPTH);

        assert!(matches!(result, Err(BurrError::UnsafeArchivePath { .. })));
        assert!(!temp_dir.path().join("nested").join("evil.js").exists());
        assert!(!temp_dir.path().join("evil.js").exists());
    }

    #[test]
    fn test_validate_extract_path() {
        assert_eq!(
            validate_extract_path(Path::new("package/index.js"), 1).unwrap(),
            Some(PathBuf::from("index.js"))
        );
        assert_eq!(validate_extract_path(Path::new("package/"), 1).unwrap(), None);
        assert!(validate_extract_path(Path::new("/etc/passwd"), 1).is_err());
        assert!(validate_extract_path(Path::new("package/../../x"), 1).is_err());
    }

    #[test]
    fn test_corrupt_archive_fails() {
        let temp_dir = tempdir().unwrap();
        let result = extract_tarball(
            std::io::Cursor::new(b"definitely not gzip".to_vec()),
            temp_dir.path(),
            NPM_WRAPPER_DEPTH,
        );
        assert!(matches!(result, Err(BurrError::Io { .. })));
    }
}
