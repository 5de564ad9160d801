//! Runtime settings resolved from the environment

use crate::catalog::CatalogSource;
use crate::product::ProductConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Per-user env file loaded before any variable is read
pub const ENV_FILE: &str = ".env";

/// Load `<home>/.env` into the process environment, if it exists
///
/// Variables already set are left alone, so loading twice is harmless.
/// Returns the path that was loaded.
pub fn load_env_file(home: &Path) -> Result<Option<PathBuf>> {
    let env_file = home.join(ENV_FILE);
    if !env_file.is_file() {
        return Ok(None);
    }
    dotenv::from_path(&env_file)
        .with_context(|| format!("Failed to load {}", env_file.display()))?;
    debug!(path = %env_file.display(), "loaded env file");
    Ok(Some(env_file))
}

/// `load_env_file` for the current user's home directory
pub fn load_user_env_file() -> Result<Option<PathBuf>> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    load_env_file(&home)
}

/// Where templates are cached and fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    /// `<home>/<cli home dir>`
    pub cli_home: PathBuf,
    /// Root of the template store
    pub template_root: PathBuf,
    /// Directory holding the cache slots
    pub store_root: PathBuf,
    pub registry_url: Url,
    pub catalog: CatalogSource,
}

impl Settings {
    /// Load `~/.env` (if present) and resolve settings from the process environment
    pub fn load<C: ProductConfig>(config: &C) -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        load_env_file(&home)?;
        Self::resolve(config, &home, |key| std::env::var(key).ok())
    }

    /// Resolve settings for `home`, reading variables through `lookup`
    pub fn resolve<C, F>(config: &C, home: &Path, lookup: F) -> Result<Self>
    where
        C: ProductConfig,
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let home_dir = var(config.home_env()).unwrap_or_else(|| config.default_home_dir().to_string());
        let cli_home = home.join(home_dir);
        let template_root = cli_home.join("template");
        let store_root = template_root.join("node_modules");

        let registry = var(config.registry_url_env())
            .unwrap_or_else(|| config.default_registry_url().to_string());
        let registry_url =
            Url::parse(&registry).with_context(|| format!("Invalid registry URL: {}", registry))?;

        let catalog = var(config.catalog_url_env())
            .unwrap_or_else(|| config.default_catalog_url().to_string());
        let catalog = CatalogSource::parse(&catalog)?;

        Ok(Self {
            home: home.to_path_buf(),
            cli_home,
            template_root,
            store_root,
            registry_url,
            catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::fixtures::TestProduct;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::resolve(&TestProduct, Path::new("/home/dev"), |key| vars.get(key).cloned())
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = resolve(&[]);
        let product = TestProduct;
        let cli_home = Path::new("/home/dev").join(product.default_home_dir());

        assert_eq!(settings.cli_home, cli_home);
        assert_eq!(settings.template_root, cli_home.join("template"));
        assert_eq!(settings.store_root, cli_home.join("template/node_modules"));
        assert_eq!(settings.registry_url.as_str(), "https://registry.npmjs.org/");
        assert_eq!(
            settings.catalog,
            CatalogSource::parse(product.default_catalog_url()).unwrap()
        );
    }

    #[test]
    fn test_env_overrides() {
        let product = TestProduct;
        let settings = resolve(&[
            (product.home_env(), ".custom-home"),
            (product.registry_url_env(), "http://localhost:4873"),
            (product.catalog_url_env(), "/srv/catalog.yaml"),
        ]);

        assert_eq!(settings.cli_home, PathBuf::from("/home/dev/.custom-home"));
        assert_eq!(settings.registry_url.as_str(), "http://localhost:4873/");
        assert_eq!(
            settings.catalog,
            CatalogSource::Local(PathBuf::from("/srv/catalog.yaml"))
        );
    }

    #[test]
    fn test_blank_override_falls_back() {
        let product = TestProduct;
        let settings = resolve(&[(product.home_env(), "  ")]);
        assert!(settings.cli_home.ends_with(product.default_home_dir()));
    }

    #[test]
    fn test_invalid_registry_url() {
        let product = TestProduct;
        let result = Settings::resolve(&product, Path::new("/home/dev"), |key| {
            (key == product.registry_url_env()).then(|| "not a url".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_env_file_loaded_into_process() {
        let home = tempfile::tempdir().unwrap();
        assert_eq!(load_env_file(home.path()).unwrap(), None);

        std::fs::write(
            home.path().join(ENV_FILE),
            "SCAFFOLDER_SETTINGS_TEST_LEVEL=verbose\n",
        )
        .unwrap();
        let loaded = load_env_file(home.path()).unwrap();

        assert_eq!(loaded, Some(home.path().join(ENV_FILE)));
        assert_eq!(
            std::env::var("SCAFFOLDER_SETTINGS_TEST_LEVEL").as_deref(),
            Ok("verbose")
        );
    }
}
