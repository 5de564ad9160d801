//! Installation dispatcher
//!
//! One run takes one catalog entry through three steps: validate that an
//! entry was chosen, acquire its artifact through the cache, then dispatch
//! on the entry's strategy.

pub mod custom;
pub mod normal;

pub use custom::{installer_invocation, InstallerOptions, CUSTOM_FAILED, INSTALL_OPTIONS_ENV};
pub use normal::{INSTALL_FAILED, START_FAILED};

use crate::cache::{ArtifactCache, CacheEntry};
use crate::catalog::{CatalogEntry, Strategy};
use crate::context::RenderContext;
use crate::error::{Result, ScaffoldError};
use crate::exec::ProcessRunner;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What to install and where
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    /// `None` when nothing was selected upstream
    pub entry: Option<&'a CatalogEntry>,
    pub context: &'a RenderContext,
    pub target_dir: &'a Path,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub strategy: Strategy,
    /// Artifact actually used, after version resolution and update
    pub artifact: CacheEntry,
    /// Files rewritten by rendering; always 0 for custom templates
    pub rendered_files: usize,
}

#[derive(Clone)]
pub struct Installer {
    cache: ArtifactCache,
    runner: Arc<dyn ProcessRunner>,
}

impl Installer {
    pub fn new(cache: ArtifactCache, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { cache, runner }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub async fn install(&self, request: InstallRequest<'_>) -> Result<InstallOutcome> {
        let entry = request.entry.ok_or(ScaffoldError::NoTemplateSelected)?;
        let artifact = self.acquire(entry).await?;
        self.materialize(entry, artifact, request.context, request.target_dir)
            .await
    }

    /// Run the entry's strategy against an already acquired artifact
    pub async fn materialize(
        &self,
        entry: &CatalogEntry,
        artifact: CacheEntry,
        context: &RenderContext,
        target_dir: &Path,
    ) -> Result<InstallOutcome> {
        info!(
            template = %entry.name,
            version = %artifact.version,
            strategy = %entry.strategy,
            "installing template"
        );

        let runner = self.runner.as_ref();
        let rendered_files = match entry.strategy {
            Strategy::Normal => {
                normal::install(&self.cache, runner, entry, &artifact, context, target_dir).await?
            }
            Strategy::Custom => {
                custom::install(&self.cache, runner, entry, &artifact, context, target_dir).await?;
                0
            }
        };

        Ok(InstallOutcome {
            strategy: entry.strategy,
            artifact,
            rendered_files,
        })
    }

    /// Resolve the entry's version and make sure the artifact is cached
    ///
    /// A miss fetches the resolved version. A hit refreshes to the newest
    /// published version, which may differ from the one requested.
    pub async fn acquire(&self, entry: &CatalogEntry) -> Result<CacheEntry> {
        let version = self.cache.resolve_version(&entry.name, &entry.version).await?;
        let artifact = CacheEntry::new(entry.name.clone(), version);

        if self.cache.exists(&artifact).await {
            self.cache.update(&artifact).await
        } else {
            self.cache.fetch(&artifact).await?;
            Ok(artifact)
        }
    }
}
