//! Product configuration trait for CLI binaries
//!
//! The core library never hard-codes where templates come from or where
//! they are cached. Each binary describes itself through this trait and
//! `Settings::load` turns it into concrete paths and URLs.

/// Configuration trait for a scaffolding CLI product
///
/// Implementors define:
/// - Product identity (name, display name, published package name)
/// - Cache home directory and its environment override
/// - Package registry and template catalog locations
/// - The upgrade hint shown when a newer CLI is published
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Name the CLI itself is published under in the package registry
    fn package_name(&self) -> &'static str;

    /// Directory under the user's home holding caches (e.g. ".scaffold")
    fn default_home_dir(&self) -> &'static str;

    /// Environment variable overriding the home directory name
    fn home_env(&self) -> &'static str;

    /// Default package registry base URL
    fn default_registry_url(&self) -> &'static str {
        "https://registry.npmjs.org"
    }

    /// Environment variable overriding the registry URL
    fn registry_url_env(&self) -> &'static str;

    /// Default location of the template catalog (URL or local path)
    fn default_catalog_url(&self) -> &'static str;

    /// Environment variable overriding the catalog location
    fn catalog_url_env(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
