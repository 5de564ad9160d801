//! Content-versioned artifact cache
//!
//! Every `(name, version)` pair owns its own slot directory:
//!
//! ```text
//! <store_root>/_<sanitized-name>@<version>@<name>/
//!     package.json
//!     template/...
//! ```
//!
//! Slots are created on first fetch and never modified afterwards. An
//! update to a newer version creates a sibling slot and leaves the old one
//! in place. The store is assumed to be owned by a single process for the
//! duration of a run; there is no locking.

use crate::catalog::RequestedVersion;
use crate::error::{Result, ScaffoldError};
use crate::registry::manifest::{find_package_dir, PackageManifest};
use crate::registry::{sanitize_name, Registry};
use semver::Version;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Fixed payload directory inside a cache slot
pub const TEMPLATE_DIR: &str = "template";

/// Where fetched artifacts live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Version-addressed slots under a store root
    Cached { store_root: PathBuf },
    /// A single package directory used as-is (no version addressing)
    Direct { target_path: PathBuf },
}

/// A resolved artifact: the version is always concrete
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheEntry {
    pub name: String,
    pub version: Version,
}

impl CacheEntry {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Same package at another version
    pub fn with_version(&self, version: Version) -> Self {
        Self::new(self.name.clone(), version)
    }
}

/// Slot directory for `name@version` under `store_root`
pub fn cache_path(store_root: &Path, name: &str, version: &Version) -> PathBuf {
    store_root.join(format!(
        "_{}@{}@{}",
        sanitize_name(name),
        version,
        name
    ))
}

/// Artifact cache manager
///
/// Holds only its collaborators; every operation takes the entry it acts
/// on and returns new entries instead of mutating itself.
#[derive(Clone)]
pub struct ArtifactCache {
    registry: Arc<dyn Registry>,
    location: StoreLocation,
}

impl ArtifactCache {
    pub fn new(registry: Arc<dyn Registry>, location: StoreLocation) -> Self {
        Self { registry, location }
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Turn a requested version into a concrete one
    pub async fn resolve_version(&self, name: &str, requested: &RequestedVersion) -> Result<Version> {
        match requested {
            RequestedVersion::Latest => {
                let version = self.registry.latest_version(name).await?;
                debug!(package = name, %version, "resolved latest");
                Ok(version)
            }
            RequestedVersion::Exact(version) => Ok(version.clone()),
        }
    }

    /// Directory holding the artifact for `entry`
    pub fn slot_path(&self, entry: &CacheEntry) -> PathBuf {
        match &self.location {
            StoreLocation::Cached { store_root } => {
                cache_path(store_root, &entry.name, &entry.version)
            }
            StoreLocation::Direct { target_path } => target_path.clone(),
        }
    }

    /// Template payload directory inside the slot
    pub fn template_dir(&self, entry: &CacheEntry) -> PathBuf {
        self.slot_path(entry).join(TEMPLATE_DIR)
    }

    pub async fn exists(&self, entry: &CacheEntry) -> bool {
        fs::try_exists(self.slot_path(entry)).await.unwrap_or(false)
    }

    /// Download `entry` into its slot
    ///
    /// Extraction happens in a staging directory next to the slot, which is
    /// renamed into place once complete. When the slot already exists the
    /// staged copy is discarded, so repeated fetches succeed.
    pub async fn fetch(&self, entry: &CacheEntry) -> Result<()> {
        let slot = self.slot_path(entry);
        let staging_parent = match &self.location {
            StoreLocation::Cached { store_root } => store_root.clone(),
            StoreLocation::Direct { target_path } => target_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        fs::create_dir_all(&staging_parent)
            .await
            .map_err(|e| ScaffoldError::cache_write(&staging_parent, e))?;

        info!(package = %entry.name, version = %entry.version, "fetching template");
        let archive = self.registry.download(&entry.name, &entry.version).await?;

        let name = entry.name.clone();
        let join = tokio::task::spawn_blocking(move || -> Result<()> {
            let staging = tempfile::Builder::new()
                .prefix(".staging-")
                .tempdir_in(&staging_parent)
                .map_err(|e| ScaffoldError::cache_write(&staging_parent, e))?;

            let files = archive.unpack(&name, staging.path())?;
            debug!(files, staging = %staging.path().display(), "unpacked artifact");

            if slot.exists() {
                debug!(slot = %slot.display(), "slot already present, discarding staged copy");
                return Ok(());
            }
            if let Some(parent) = slot.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ScaffoldError::cache_write(parent, e))?;
            }
            std::fs::rename(staging.path(), &slot).map_err(|e| ScaffoldError::cache_write(&slot, e))?;
            Ok(())
        })
        .await;

        match join {
            Ok(result) => result,
            Err(e) => Err(ScaffoldError::cache_write(
                self.slot_path(entry),
                std::io::Error::other(e.to_string()),
            )),
        }
    }

    /// Move to the newest published version, fetching it if needed
    ///
    /// The slot for `entry`'s own version is left untouched.
    pub async fn update(&self, entry: &CacheEntry) -> Result<CacheEntry> {
        let latest = self.registry.latest_version(&entry.name).await?;
        let updated = entry.with_version(latest);

        if self.exists(&updated).await {
            debug!(package = %updated.name, version = %updated.version, "latest already cached");
        } else {
            info!(
                package = %updated.name,
                from = %entry.version,
                to = %updated.version,
                "updating template"
            );
            self.fetch(&updated).await?;
        }

        Ok(updated)
    }

    /// Entry-point file declared by the artifact's `package.json` `main` field
    pub async fn root_installer_path(&self, entry: &CacheEntry) -> Option<PathBuf> {
        let slot = self.slot_path(entry);
        let package_dir = find_package_dir(&slot)?;

        let manifest = match PackageManifest::read(&package_dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable package manifest");
                return None;
            }
        };

        manifest
            .main
            .filter(|main| !main.trim().is_empty())
            .map(|main| package_dir.join(main))
    }
}
