//! Template package manifest (`package.json`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` the scaffolder cares about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    /// Entry point of custom installers, relative to the manifest
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    /// Read and parse `package.json` from a package directory
    pub fn read(package_dir: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = package_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Nearest directory at or above `start` that holds a `package.json`
pub fn find_package_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_package_dir_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "{}").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_package_dir(&nested).unwrap(), dir.path());
    }

    #[test]
    fn test_read_manifest_without_main() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"name": "tpl-a", "version": "1.0.0"}"#,
        )
        .unwrap();

        let manifest = PackageManifest::read(dir.path()).unwrap();
        assert_eq!(manifest.name, "tpl-a");
        assert!(manifest.main.is_none());
    }
}
