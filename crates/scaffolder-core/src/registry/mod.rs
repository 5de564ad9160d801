//! Package registry access
//!
//! Templates are ordinary packages. A registry answers two questions:
//! which version is the newest, and what are the bytes of `name@version`.
//!
//! - `HttpRegistry`: npm-compatible registries over HTTP (gzip tarballs)
//! - `LocalRegistry`: a directory of zipped packages, for offline and development use

pub mod archive;
pub mod http;
pub mod local;
pub mod manifest;

use crate::error::Result;
use async_trait::async_trait;
use semver::Version;

pub use archive::Archive;
pub use http::HttpRegistry;
pub use local::{pack_template, LocalRegistry, PackedTemplate};
pub use manifest::PackageManifest;

/// Source of published template packages
#[async_trait]
pub trait Registry: Send + Sync {
    /// Newest published version of `name`
    async fn latest_version(&self, name: &str) -> Result<Version>;

    /// Download the artifact for `name@version`
    async fn download(&self, name: &str, version: &Version) -> Result<Archive>;
}

/// Replace path separators in scoped names (`@scope/pkg` -> `@scope_pkg`)
pub fn sanitize_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_scoped_name() {
        assert_eq!(sanitize_name("@lwd/template-vue"), "@lwd_template-vue");
        assert_eq!(sanitize_name("plain"), "plain");
    }
}
