//! Glob rules deciding which target files are never rendered

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::warn;

/// Dependency trees are never rendered, whatever the template declares
pub const DEPENDENCY_TREE_PATTERN: &str = "**/node_modules/**";

/// Compiled ignore patterns, matched against paths relative to the target
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    set: GlobSet,
}

impl IgnoreRules {
    /// Compile template patterns plus the built-in dependency-tree rule
    ///
    /// `*` and `?` never cross a `/`; use `**` to span directories.
    /// Patterns that fail to compile are logged and skipped.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();

        let all = patterns
            .iter()
            .map(AsRef::as_ref)
            .chain(std::iter::once(DEPENDENCY_TREE_PATTERN));

        for pattern in all {
            match GlobBuilder::new(pattern).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                    kept.push(pattern.to_string());
                }
                Err(e) => warn!(pattern, error = %e, "skipping invalid ignore pattern"),
            }
        }

        let set = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "ignore patterns could not be combined, nothing is ignored");
            GlobSet::empty()
        });

        Self { patterns: kept, set }
    }

    /// Patterns that compiled, built-in rule included
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.set.is_match(relative)
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new::<&str>(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rule_always_present() {
        let rules = IgnoreRules::default();
        assert_eq!(rules.patterns(), [DEPENDENCY_TREE_PATTERN.to_string()]);
        assert!(rules.is_ignored(Path::new("node_modules/react/index.js")));
        assert!(rules.is_ignored(Path::new("packages/ui/node_modules/x/y.js")));
        assert!(!rules.is_ignored(Path::new("src/index.js")));
    }

    #[test]
    fn test_single_star_stays_in_one_directory() {
        let rules = IgnoreRules::new(&["*.png", "public/**"]);
        assert!(rules.is_ignored(Path::new("logo.png")));
        assert!(!rules.is_ignored(Path::new("assets/logo.png")));
        assert!(rules.is_ignored(Path::new("public/fonts/a.woff")));
    }

    #[test]
    fn test_double_star_spans_directories() {
        let rules = IgnoreRules::new(&["**/*.png"]);
        assert!(rules.is_ignored(Path::new("logo.png")));
        assert!(rules.is_ignored(Path::new("assets/img/logo.png")));
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let rules = IgnoreRules::new(&["src/[", "*.lock"]);
        assert_eq!(rules.patterns().len(), 2);
        assert!(rules.is_ignored(Path::new("yarn.lock")));
    }
}
