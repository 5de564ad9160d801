//! Materialization of a cached template into a target directory
//!
//! This module provides:
//! - `copy_tree`: unfiltered recursive copy of the payload
//! - `render_tree`: transactional in-place rendering honoring `IgnoreRules`
//! - Target directory checks used before init (`is_dir_empty`, `empty_dir`)

pub mod copy;
pub mod ignore;
pub mod render;

pub use copy::copy_tree;
pub use ignore::{IgnoreRules, DEPENDENCY_TREE_PATTERN};
pub use render::render_tree;

use crate::error::{Result, ScaffoldError};
use std::io;
use std::path::Path;
use tokio::fs;

/// Whether `dir` holds nothing but dot-entries and `node_modules`
///
/// A missing directory counts as empty.
pub async fn is_dir_empty(dir: &Path) -> Result<bool> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(ScaffoldError::materialize(dir, e)),
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ScaffoldError::materialize(dir, e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with('.') && name != "node_modules" {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Remove everything inside `dir`, keeping the directory itself
pub async fn empty_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ScaffoldError::materialize(dir, e))?;

    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ScaffoldError::materialize(dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ScaffoldError::materialize(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| ScaffoldError::materialize(&path, e))?;

        let removed = if file_type.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        removed.map_err(|e| ScaffoldError::materialize(&path, e))?;
    }

    Ok(())
}
