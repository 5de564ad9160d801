//! Custom strategy: hand the whole materialization to the template's installer
//!
//! The installer runs as a separate process. It receives the options as
//! JSON on stdin, and the path of a file holding the same JSON in
//! `SCAFFOLD_INSTALL_OPTIONS`. Only its exit status is observed.

use crate::cache::{ArtifactCache, CacheEntry};
use crate::catalog::CatalogEntry;
use crate::context::RenderContext;
use crate::error::{Result, ScaffoldError};
use crate::exec::{Invocation, ProcessRunner};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const INSTALL_OPTIONS_ENV: &str = "SCAFFOLD_INSTALL_OPTIONS";
pub const CUSTOM_FAILED: &str = "custom installer failed";

/// Options handed to a custom installer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerOptions<'a> {
    pub template_info: &'a CatalogEntry,
    pub project_info: &'a RenderContext,
    pub source_path: PathBuf,
    pub target_path: PathBuf,
}

pub(crate) async fn install(
    cache: &ArtifactCache,
    runner: &dyn ProcessRunner,
    entry: &CatalogEntry,
    artifact: &CacheEntry,
    context: &RenderContext,
    target_dir: &Path,
) -> Result<()> {
    let missing = |path: Option<PathBuf>| ScaffoldError::CustomInstallerMissing {
        template: entry.name.clone(),
        path,
    };

    if !cache.exists(artifact).await {
        return Err(missing(None));
    }
    let entry_point = cache
        .root_installer_path(artifact)
        .await
        .ok_or_else(|| missing(None))?;
    if !tokio::fs::try_exists(&entry_point).await.unwrap_or(false) {
        return Err(missing(Some(entry_point)));
    }

    let options = InstallerOptions {
        template_info: entry,
        project_info: context,
        source_path: cache.template_dir(artifact),
        target_path: target_dir.to_path_buf(),
    };
    let payload = serde_json::to_vec(&options).map_err(|e| ScaffoldError::CommandFailed {
        command: entry_point.display().to_string(),
        message: format!("{}: {}", CUSTOM_FAILED, e),
        code: None,
    })?;

    // Kept alive until the installer exits
    let options_file = write_options_file(&payload)?;

    let invocation = installer_invocation(&entry_point, target_dir)
        .with_stdin(payload)
        .with_env(INSTALL_OPTIONS_ENV, options_file.path().display().to_string());
    let command = invocation.display();
    info!(command = %command, "running custom installer");

    let status = runner
        .run(&invocation)
        .await
        .map_err(|e| ScaffoldError::CommandFailed {
            command: command.clone(),
            message: format!("{}: {}", CUSTOM_FAILED, e),
            code: None,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(ScaffoldError::CommandFailed {
            command,
            message: CUSTOM_FAILED.to_string(),
            code: status.code(),
        })
    }
}

fn write_options_file(payload: &[u8]) -> Result<tempfile::NamedTempFile> {
    let dir = std::env::temp_dir();
    let mut file = tempfile::Builder::new()
        .prefix("scaffold-options-")
        .suffix(".json")
        .tempfile_in(&dir)
        .map_err(|e| ScaffoldError::cache_write(&dir, e))?;
    file.write_all(payload)
        .map_err(|e| ScaffoldError::cache_write(file.path(), e))?;
    Ok(file)
}

/// Pick an interpreter from the entry point's extension
pub fn installer_invocation(entry_point: &Path, cwd: &Path) -> Invocation {
    let script = entry_point.display().to_string();
    let extension = entry_point
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match extension {
        "js" | "cjs" | "mjs" => Invocation::new("node", vec![script], cwd),
        "py" => Invocation::new("python3", vec![script], cwd),
        "sh" => Invocation::new("sh", vec![script], cwd),
        _ => Invocation::new(script, Vec::new(), cwd),
    }
}
