//! Recursive copy of a cached template payload into the target

use crate::error::{Result, ScaffoldError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Copy every file under `src` into `dst`, overwriting existing paths
///
/// The copy is unfiltered; ignore rules only apply to rendering.
/// Returns the number of files copied.
pub async fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();

    tokio::task::spawn_blocking(move || copy_tree_blocking(&src, &dst))
        .await
        .map_err(|e| ScaffoldError::MaterializeFailed {
            path: PathBuf::new(),
            source: io::Error::other(e),
        })?
}

fn copy_tree_blocking(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).map_err(|e| ScaffoldError::materialize(dst, e))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            ScaffoldError::materialize(path, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .unwrap_or_else(|_| entry.path());
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ScaffoldError::materialize(&target, e))?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ScaffoldError::materialize(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| ScaffoldError::materialize(&target, e))?;
            copied += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    debug!(copied, from = %src.display(), to = %dst.display(), "copied template tree");
    Ok(copied)
}
