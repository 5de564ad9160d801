//! Downloaded artifact archives and their extraction
//!
//! Both archive flavours carry a single top-level directory (`package/`
//! for registry tarballs, the template name for local zips). Extraction
//! strips that first component so the slot directly holds the package.

use crate::error::{Result, ScaffoldError};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};
use zip::ZipArchive;

/// Raw artifact bytes as returned by a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Archive {
    /// Gzip-compressed tarball (npm-compatible registries)
    Tarball(Vec<u8>),
    /// Zip archive (local registries)
    Zip(Vec<u8>),
}

impl Archive {
    /// Extract into `dest`, returning the number of files written
    pub fn unpack(&self, package: &str, dest: &Path) -> Result<usize> {
        let invalid = |reason: String| ScaffoldError::InvalidArchive {
            package: package.to_string(),
            reason,
        };

        fs::create_dir_all(dest).map_err(|e| ScaffoldError::cache_write(dest, e))?;

        match self {
            Archive::Tarball(bytes) => unpack_tarball(bytes, dest, &invalid),
            Archive::Zip(bytes) => unpack_zip(bytes, dest, &invalid),
        }
    }
}

fn unpack_tarball(
    bytes: &[u8],
    dest: &Path,
    invalid: &dyn Fn(String) -> ScaffoldError,
) -> Result<usize> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let entries = archive.entries().map_err(|e| invalid(e.to_string()))?;

    let mut written = 0;
    for entry in entries {
        let mut entry = entry.map_err(|e| invalid(e.to_string()))?;

        // Only regular files; links and device nodes are never materialized
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw = entry
            .path()
            .map_err(|e| invalid(e.to_string()))?
            .into_owned();
        let Some(relative) = strip_package_root(&raw).map_err(invalid)? else {
            continue;
        };

        let out = dest.join(relative);
        ensure_parent(&out)?;
        entry
            .unpack(&out)
            .map_err(|e| ScaffoldError::cache_write(&out, e))?;
        written += 1;
    }

    Ok(written)
}

fn unpack_zip(
    bytes: &[u8],
    dest: &Path,
    invalid: &dyn Fn(String) -> ScaffoldError,
) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| invalid(e.to_string()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| invalid(e.to_string()))?;

        // Skip directories
        if file.is_dir() {
            continue;
        }

        let raw = file
            .enclosed_name()
            .ok_or_else(|| invalid(format!("unsafe entry path '{}'", file.name())))?;
        let Some(relative) = strip_package_root(&raw).map_err(invalid)? else {
            continue;
        };

        let out = dest.join(relative);
        ensure_parent(&out)?;
        let mut target = fs::File::create(&out).map_err(|e| ScaffoldError::cache_write(&out, e))?;
        io::copy(&mut file, &mut target).map_err(|e| ScaffoldError::cache_write(&out, e))?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            // Owner keeps read/write so later renders can replace the file
            fs::set_permissions(&out, fs::Permissions::from_mode((mode & 0o777) | 0o600))
                .map_err(|e| ScaffoldError::cache_write(&out, e))?;
        }

        written += 1;
    }

    Ok(written)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ScaffoldError::cache_write(parent, e))?;
    }
    Ok(())
}

/// Drop the archive's top-level directory from an entry path
///
/// Returns `Ok(None)` for the root itself and an error for entries that
/// would land outside the destination.
pub(crate) fn strip_package_root(raw: &Path) -> std::result::Result<Option<PathBuf>, String> {
    let mut components = raw.components();
    match components.next() {
        Some(Component::Normal(_)) => {}
        Some(Component::CurDir) => return strip_package_root(components.as_path()),
        _ => return Err(format!("unsafe entry path '{}'", raw.display())),
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return Err(format!("unsafe entry path '{}'", raw.display())),
        }
    }

    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn zipped(files: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            for (path, content) in files {
                zip.start_file(*path, SimpleFileOptions::default()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[test]
    fn test_strip_package_root() {
        assert_eq!(
            strip_package_root(Path::new("package/template/a.txt")).unwrap(),
            Some(PathBuf::from("template/a.txt"))
        );
        assert_eq!(strip_package_root(Path::new("package")).unwrap(), None);
        assert!(strip_package_root(Path::new("package/../../etc/passwd")).is_err());
        assert!(strip_package_root(Path::new("/abs/file")).is_err());
    }

    #[test]
    fn test_unpack_tarball_strips_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::Tarball(tarball(&[
            ("package/package.json", "{}"),
            ("package/template/README.md", "hello"),
        ]));

        let written = archive.unpack("tpl-a", dir.path()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("template/README.md")).unwrap(),
            "hello"
        );
        assert!(dir.path().join("package.json").exists());
    }

    #[test]
    fn test_unpack_zip_strips_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = Archive::Zip(zipped(&[("tpl-a/template/index.js", "x")]));

        archive.unpack("tpl-a", dir.path()).unwrap();
        assert!(dir.path().join("template/index.js").exists());
    }

    #[test]
    fn test_corrupt_archive_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = Archive::Zip(b"not a zip".to_vec())
            .unpack("tpl-a", dir.path())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidArchive { .. }));
    }
}
