//! Directory-backed registry of zipped template packages
//!
//! Layout: `<root>/<sanitized-name>/<version>.zip`, each zip holding a
//! single top-level directory with the package contents. `pack_template`
//! builds such a zip from a template package folder so local development
//! goes through exactly the same unpack path as remote downloads.

use super::manifest::PackageManifest;
use super::{sanitize_name, Archive, Registry};
use crate::error::{Result, ScaffoldError};
use crate::version::parse_version;
use anyhow::Context;
use async_trait::async_trait;
use semver::Version;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Zip file name prefix for every entry in a packed template
const PACKAGE_ROOT: &str = "package";

/// A template package packed into zip bytes
#[derive(Debug, Clone)]
pub struct PackedTemplate {
    pub name: String,
    pub version: Version,
    pub bytes: Vec<u8>,
}

/// Build a zip for a template package folder (reads name/version from package.json)
/// Dependency directories are never packed
pub fn pack_template(package_dir: &Path) -> anyhow::Result<PackedTemplate> {
    let manifest = PackageManifest::read(package_dir)?;
    if manifest.name.trim().is_empty() {
        anyhow::bail!("package.json in {} has no name", package_dir.display());
    }
    let version = parse_version(&manifest.version)
        .with_context(|| format!("Invalid version in {}", package_dir.display()))?;

    let mut zip_buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let walker = WalkDir::new(package_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != "node_modules");

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", package_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(package_dir)
                .context("Walked outside the package directory")?;
            let zip_path = format!(
                "{}/{}",
                PACKAGE_ROOT,
                relative.to_string_lossy().replace('\\', "/")
            );

            let content = std::fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;

            #[cfg(unix)]
            let options = {
                use std::os::unix::fs::PermissionsExt;
                let mode = entry.metadata()?.permissions().mode();
                options.unix_permissions(mode & 0o777)
            };

            zip.start_file(zip_path, options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
    }

    Ok(PackedTemplate {
        name: manifest.name,
        version,
        bytes: zip_buffer,
    })
}

/// Registry reading zipped packages from a local directory
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join(sanitize_name(name))
    }

    fn archive_path(&self, name: &str, version: &Version) -> PathBuf {
        self.package_dir(name).join(format!("{}.zip", version))
    }

    /// Pack a template folder and store it in this registry
    pub async fn publish(&self, package_dir: &Path) -> anyhow::Result<PathBuf> {
        let packed = pack_template(package_dir)?;
        let path = self.archive_path(&packed.name, &packed.version);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(&path, &packed.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// All versions present for a package
    pub async fn versions(&self, name: &str) -> Result<Vec<Version>> {
        let dir = self.package_dir(name);
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| ScaffoldError::registry(name, format!("{}: {}", dir.display(), e)))?;

        let mut versions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScaffoldError::registry(name, e))?
        {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(stem) = file_name.strip_suffix(".zip") {
                if let Ok(version) = parse_version(stem) {
                    versions.push(version);
                }
            }
        }

        versions.sort();
        Ok(versions)
    }
}

#[async_trait]
impl Registry for LocalRegistry {
    async fn latest_version(&self, name: &str) -> Result<Version> {
        self.versions(name)
            .await?
            .into_iter()
            .filter(|v| v.pre.is_empty())
            .max()
            .ok_or_else(|| ScaffoldError::registry(name, "no published versions"))
    }

    async fn download(&self, name: &str, version: &Version) -> Result<Archive> {
        let path = self.archive_path(name, version);
        let bytes = fs::read(&path)
            .await
            .map_err(|e| ScaffoldError::registry(name, format!("{}: {}", path.display(), e)))?;
        Ok(Archive::Zip(bytes))
    }
}
