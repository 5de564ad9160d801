//! In-place rendering of a materialized template
//!
//! Rendering happens in two phases. Every matched file is rendered in
//! memory, one task per file. Only when all of them succeed are the
//! results written back, each through a temp file in the same directory
//! that is then persisted over the existing file. A render failure therefore
//! leaves every file under the target untouched.
//!
//! Placeholders use `<%= key %>`, with `<% %>` blocks and `<%# %>` comments.
//! Brace syntax such as `{{ msg }}` in Vue or workflow files passes through.
//! Entries whose name starts with a dot are never rendered.

use super::IgnoreRules;
use crate::context::RenderContext;
use crate::error::{Result, ScaffoldError};
use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A file whose rendered content is ready to be written back
struct Rendered {
    path: PathBuf,
    content: String,
}

/// Render every non-ignored file under `dir` against `context`
///
/// Returns the number of files rewritten.
pub async fn render_tree(dir: &Path, rules: &IgnoreRules, context: &RenderContext) -> Result<usize> {
    let files = collect_files(dir, rules)?;
    debug!(count = files.len(), dir = %dir.display(), "rendering template files");

    let env = environment().map_err(|e| ScaffoldError::RenderFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    let env = Arc::new(env);
    let context = Arc::new(context.clone());

    let mut tasks = JoinSet::new();
    for path in files {
        let env = Arc::clone(&env);
        let context = Arc::clone(&context);
        tasks.spawn(async move { render_file(&env, &context, path).await });
    }

    let mut rendered = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| ScaffoldError::RenderFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        // Returning early drops the set, aborting the renders still in flight
        if let Some(file) = outcome? {
            rendered.push(file);
        }
    }

    let count = rendered.len();
    tokio::task::spawn_blocking(move || write_all(rendered))
        .await
        .map_err(|e| ScaffoldError::MaterializeFailed {
            path: PathBuf::new(),
            source: io::Error::other(e),
        })??;

    Ok(count)
}

fn environment() -> std::result::Result<Environment<'static>, minijinja::Error> {
    let syntax = SyntaxConfig::builder()
        .block_delimiters("<%", "%>")
        .variable_delimiters("<%=", "%>")
        .comment_delimiters("<%#", "%>")
        .build()?;

    let mut env = Environment::new();
    env.set_syntax(syntax);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    Ok(env)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Files under `dir` that are not matched by `rules`
fn collect_files(dir: &Path, rules: &IgnoreRules) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            !is_hidden(entry) && !(entry.file_type().is_dir() && entry.file_name() == "node_modules")
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ScaffoldError::materialize(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir).unwrap_or_else(|_| entry.path());
        if rules.is_ignored(relative) {
            debug!(path = %relative.display(), "ignored, not rendering");
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

async fn render_file(
    env: &Environment<'static>,
    context: &RenderContext,
    path: PathBuf,
) -> Result<Option<Rendered>> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ScaffoldError::materialize(&path, e))?;

    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(_) => {
            warn!(path = %path.display(), "not valid UTF-8, leaving untouched");
            return Ok(None);
        }
    };

    let content = env
        .render_str(&source, context)
        .map_err(|e| ScaffoldError::RenderFailed {
            path: path.clone(),
            reason: render_reason(&e),
        })?;

    Ok(Some(Rendered { path, content }))
}

fn render_reason(error: &minijinja::Error) -> String {
    match error.line() {
        Some(line) => format!("line {}: {}", line, error),
        None => error.to_string(),
    }
}

fn write_all(rendered: Vec<Rendered>) -> Result<()> {
    for file in rendered {
        replace_file(&file.path, file.content.as_bytes())
            .map_err(|e| ScaffoldError::materialize(&file.path, e))?;
    }
    Ok(())
}

/// Atomically replace `path`, keeping its permissions
fn replace_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), permissions)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
