//! Normal strategy: copy, render, then run the template's commands

use crate::cache::{ArtifactCache, CacheEntry};
use crate::catalog::CatalogEntry;
use crate::context::RenderContext;
use crate::error::{Result, ScaffoldError};
use crate::exec::{run_guarded, ProcessRunner};
use crate::materialize::{copy_tree, render_tree, IgnoreRules};
use std::path::Path;
use tokio::fs;
use tracing::info;

pub const INSTALL_FAILED: &str = "dependency installation failed";
pub const START_FAILED: &str = "start command failed";

/// Returns the number of rendered files
pub(crate) async fn install(
    cache: &ArtifactCache,
    runner: &dyn ProcessRunner,
    entry: &CatalogEntry,
    artifact: &CacheEntry,
    context: &RenderContext,
    target_dir: &Path,
) -> Result<usize> {
    let template_dir = cache.template_dir(artifact);
    for dir in [template_dir.as_path(), target_dir] {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| ScaffoldError::cache_write(dir, e))?;
    }

    let copied = copy_tree(&template_dir, target_dir).await?;
    info!(copied, target = %target_dir.display(), "template copied");

    let rules = IgnoreRules::new(&entry.ignore);
    let rendered = render_tree(target_dir, &rules, context).await?;
    info!(rendered, "template rendered");

    if let Some(command) = &entry.install_command {
        run_guarded(runner, command, target_dir, INSTALL_FAILED).await?;
    }
    if let Some(command) = &entry.start_command {
        run_guarded(runner, command, target_dir, START_FAILED).await?;
    }

    Ok(rendered)
}
