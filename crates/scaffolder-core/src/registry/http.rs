//! npm-compatible registry client

use super::{Archive, Registry};
use crate::error::{Result, ScaffoldError};
use crate::version::parse_version;
use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Registry document listing every published version of a package
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,

    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

impl Packument {
    /// `dist-tags.latest`, falling back to the highest published release
    fn latest(&self) -> Option<Version> {
        if let Some(tagged) = self.dist_tags.get("latest").and_then(|v| parse_version(v).ok()) {
            return Some(tagged);
        }
        self.versions
            .keys()
            .filter_map(|v| parse_version(v).ok())
            .filter(|v| v.pre.is_empty())
            .max()
    }
}

/// Manifest of a single published version
#[derive(Debug, Deserialize)]
struct VersionDocument {
    dist: Dist,
}

#[derive(Debug, Deserialize)]
struct Dist {
    tarball: String,
}

/// Registry speaking the npm HTTP protocol
pub struct HttpRegistry {
    base: Url,
    client: reqwest::Client,
}

impl HttpRegistry {
    /// Create a new registry client with a custom user agent
    pub fn new(base: Url, user_agent: &str) -> Self {
        Self {
            base,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Build a URL by appending path segments, preserving query parameters
    ///
    /// Scoped names stay one segment (`@scope%2Fpkg`), as the registry expects.
    fn build_url(base: &Url, segments: &[&str]) -> std::result::Result<Url, String> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| format!("URL cannot have path segments: {}", base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, name: &str, url: Url) -> Result<T> {
        debug!(%url, "querying registry");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ScaffoldError::registry(name, e))?;

        if !response.status().is_success() {
            return Err(ScaffoldError::registry(
                name,
                format!("HTTP {} from {}", response.status(), url),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ScaffoldError::registry(name, e))
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn latest_version(&self, name: &str) -> Result<Version> {
        let url = Self::build_url(&self.base, &[name]).map_err(|e| ScaffoldError::registry(name, e))?;
        let packument: Packument = self.get_json(name, url).await?;
        packument
            .latest()
            .ok_or_else(|| ScaffoldError::registry(name, "no published versions"))
    }

    async fn download(&self, name: &str, version: &Version) -> Result<Archive> {
        let version_str = version.to_string();
        let url = Self::build_url(&self.base, &[name, &version_str])
            .map_err(|e| ScaffoldError::registry(name, e))?;
        let document: VersionDocument = self.get_json(name, url).await?;

        debug!(tarball = %document.dist.tarball, "downloading package");
        let response = self
            .client
            .get(&document.dist.tarball)
            .send()
            .await
            .map_err(|e| ScaffoldError::registry(name, e))?;

        if !response.status().is_success() {
            return Err(ScaffoldError::registry(
                name,
                format!(
                    "HTTP {} downloading {}",
                    response.status(),
                    document.dist.tarball
                ),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScaffoldError::registry(name, e))?;
        Ok(Archive::Tarball(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_encodes_scoped_names() {
        let base = Url::parse("https://registry.npmjs.org/").unwrap();
        let url = HttpRegistry::build_url(&base, &["@lwd/template", "1.0.0"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://registry.npmjs.org/@lwd%2Ftemplate/1.0.0"
        );
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let base = Url::parse("https://mirror.example.com/npm").unwrap();
        let url = HttpRegistry::build_url(&base, &["tpl-a"]).unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.com/npm/tpl-a");
    }

    #[test]
    fn test_latest_prefers_dist_tag() {
        let packument: Packument = serde_json::from_str(
            r#"{"dist-tags": {"latest": "2.3.0"}, "versions": {"2.3.0": {}, "3.0.0-beta.1": {}}}"#,
        )
        .unwrap();
        assert_eq!(packument.latest(), Some(Version::new(2, 3, 0)));
    }

    #[test]
    fn test_latest_falls_back_to_highest_release() {
        let packument: Packument = serde_json::from_str(
            r#"{"versions": {"1.0.0": {}, "1.10.0": {}, "1.9.0": {}, "2.0.0-rc.1": {}}}"#,
        )
        .unwrap();
        assert_eq!(packument.latest(), Some(Version::new(1, 10, 0)));
    }

    #[test]
    fn test_latest_without_versions() {
        let packument: Packument = serde_json::from_str("{}").unwrap();
        assert!(packument.latest().is_none());
    }
}
