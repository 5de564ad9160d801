//! Template catalog retrieval from a remote endpoint or a local file

use super::entry::CatalogRecord;
use super::Catalog;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use url::Url;

/// Catalog source - either remote URL or local file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Remote(Url),
    Local(PathBuf),
}

impl CatalogSource {
    /// Interpret a configured location: http(s) URLs are remote, anything else is a path
    pub fn parse(location: &str) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let url = Url::parse(location)
                .with_context(|| format!("Invalid catalog URL: {}", location))?;
            Ok(Self::Remote(url))
        } else {
            Ok(Self::Local(PathBuf::from(location)))
        }
    }

    /// Fetch and parse the catalog
    pub async fn load(&self, client: &reqwest::Client) -> Result<Catalog> {
        let content = match self {
            CatalogSource::Remote(url) => {
                debug!(%url, "fetching template catalog");
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch template catalog from {}", url))?;

                if !response.status().is_success() {
                    anyhow::bail!(
                        "Failed to fetch template catalog from {}: HTTP {}",
                        url,
                        response.status()
                    );
                }

                response.text().await?
            }
            CatalogSource::Local(path) => fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        };

        parse_catalog(&content)
    }
}

/// Parse catalog text (YAML or JSON list of records)
///
/// Only malformed text fails; a record with an unknown `type` or a bad
/// version is set aside without affecting the others.
pub fn parse_catalog(content: &str) -> Result<Catalog> {
    let records: Vec<CatalogRecord> =
        serde_yaml::from_str(content).context("Failed to parse template catalog")?;

    Ok(Catalog::from_records(records))
}
