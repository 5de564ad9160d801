//! Scaffolder Core - versioned template scaffolding
//!
//! This library resolves templates from a catalog, keeps their artifacts in a
//! content-versioned local cache, and materializes them into a target
//! directory. Binaries supply a `ProductConfig` and drive the pipeline, either
//! through the low-level APIs or the optional interactive flow.
//!
//! # Architecture
//!
//! - **Acquisition** - `catalog`, `registry` and `cache`: turn a catalog entry
//!   into a concrete, locally cached artifact version
//! - **Materialization** - `materialize`, `exec` and `install`: copy and render
//!   the payload, run allow-listed commands, or hand off to a custom installer
//! - **Interface** - `config`, `product` and the cliclack prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use scaffolder_core::{ArtifactCache, HttpRegistry, InstallRequest, Installer, StoreLocation, SystemRunner};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(HttpRegistry::new(settings.registry_url.clone(), "my-cli"));
//! let cache = ArtifactCache::new(registry, StoreLocation::Cached { store_root });
//! let installer = Installer::new(cache, Arc::new(SystemRunner));
//! let outcome = installer
//!     .install(InstallRequest { entry: catalog.find("tpl-a"), context: &context, target_dir: &dir })
//!     .await?;
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod install;
pub mod materialize;
pub mod product;
pub mod registry;
pub mod version;

#[cfg(test)]
mod testing;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use cache::{cache_path, ArtifactCache, CacheEntry, StoreLocation};
pub use catalog::{Catalog, CatalogEntry, CatalogSource, RequestedVersion, Strategy, TemplateKind};
pub use config::Settings;
pub use context::{ProjectInfo, RenderContext};
pub use error::{Result, ScaffoldError};
pub use exec::{GuardedCommand, Invocation, PackageManager, ProcessRunner, SystemRunner};
pub use install::{InstallOutcome, InstallRequest, Installer};
pub use materialize::IgnoreRules;
pub use product::ProductConfig;
pub use registry::{Archive, HttpRegistry, LocalRegistry, Registry};

#[cfg(feature = "tui")]
pub use tui::run;
