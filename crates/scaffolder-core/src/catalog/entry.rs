//! Catalog entry types and parsing

use crate::error::{Result, ScaffoldError};
use crate::version::parse_version;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version requested by a catalog entry, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    /// Newest published version, resolved against the registry
    Latest,
    Exact(Version),
}

impl RequestedVersion {
    pub fn parse(value: &str) -> Result<Self> {
        if value.trim().eq_ignore_ascii_case("latest") {
            Ok(Self::Latest)
        } else {
            parse_version(value).map(Self::Exact)
        }
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedVersion::Latest => write!(f, "latest"),
            RequestedVersion::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// How a template gets materialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Copy, render, then run whitelisted commands
    #[default]
    Normal,
    /// Hand off to the template's own installer process
    Custom,
}

impl Strategy {
    fn parse(template: &str, value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(v) if v.eq_ignore_ascii_case("normal") => Ok(Self::Normal),
            Some(v) if v.eq_ignore_ascii_case("custom") => Ok(Self::Custom),
            Some(v) => Err(ScaffoldError::UnknownStrategy {
                template: template.to_string(),
                value: v.to_string(),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Normal => write!(f, "normal"),
            Strategy::Custom => write!(f, "custom"),
        }
    }
}

/// Whether a template produces a whole project or a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Project,
    Component,
}

impl TemplateKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateKind::Project => "Project",
            TemplateKind::Component => "Component",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Project => "project",
            TemplateKind::Component => "component",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_tags() -> Vec<TemplateKind> {
    vec![TemplateKind::Project, TemplateKind::Component]
}

/// Catalog record as served by the catalog endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// Package name in the registry
    pub name: String,

    /// Human-readable name; falls back to `name`
    #[serde(default)]
    pub display_name: Option<String>,

    /// Semver version or "latest"
    #[serde(default = "default_version")]
    pub version: String,

    /// "normal" or "custom"; missing means normal
    #[serde(default, rename = "type")]
    pub strategy: Option<String>,

    /// Globs excluded from rendering
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub install_command: Option<String>,

    #[serde(default)]
    pub start_command: Option<String>,

    /// Kinds this template can create
    #[serde(default = "default_tags", alias = "tags")]
    pub tag: Vec<TemplateKind>,
}

/// One installable template, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub display_name: String,
    #[serde(serialize_with = "serialize_display")]
    pub version: RequestedVersion,
    #[serde(rename = "type")]
    pub strategy: Strategy,
    pub ignore: Vec<String>,
    pub install_command: Option<String>,
    pub start_command: Option<String>,
    pub tags: Vec<TemplateKind>,
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl CatalogEntry {
    /// Convert a wire record, applying the strategy default exactly once
    pub fn from_record(record: CatalogRecord) -> Result<Self> {
        let strategy = Strategy::parse(&record.name, record.strategy.as_deref())?;
        let version = RequestedVersion::parse(&record.version)?;
        let display_name = record
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| record.name.clone());

        Ok(Self {
            name: record.name,
            display_name,
            version,
            strategy,
            ignore: record.ignore,
            install_command: non_empty(record.install_command),
            start_command: non_empty(record.start_command),
            tags: record.tag,
        })
    }

    /// Check if this template can create the given kind
    pub fn supports(&self, kind: TemplateKind) -> bool {
        self.tags.contains(&kind)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(yaml: &str) -> CatalogRecord {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_missing_type_defaults_to_normal() {
        let entry = CatalogEntry::from_record(record("name: tpl-a\nversion: 1.0.0")).unwrap();
        assert_eq!(entry.strategy, Strategy::Normal);
        assert_eq!(entry.display_name, "tpl-a");
        assert_eq!(
            entry.version,
            RequestedVersion::Exact(Version::new(1, 0, 0))
        );
    }

    #[test]
    fn test_custom_type() {
        let entry = CatalogEntry::from_record(record("name: tpl-c\ntype: custom")).unwrap();
        assert_eq!(entry.strategy, Strategy::Custom);
        assert_eq!(entry.version, RequestedVersion::Latest);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = CatalogEntry::from_record(record("name: tpl-x\ntype: magic")).unwrap_err();
        match err {
            ScaffoldError::UnknownStrategy { template, value } => {
                assert_eq!(template, "tpl-x");
                assert_eq!(value, "magic");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_version_rejected() {
        let err = CatalogEntry::from_record(record("name: tpl-x\nversion: one")).unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidVersion { .. }));
    }

    #[test]
    fn test_json_record_with_commands() {
        let rec: CatalogRecord = serde_json::from_str(
            r#"{
                "name": "tpl-vue",
                "displayName": "Vue starter",
                "version": "2.1.0",
                "type": "normal",
                "ignore": ["**/public/**"],
                "installCommand": "npm install",
                "startCommand": " ",
                "tag": ["project"]
            }"#,
        )
        .unwrap();
        let entry = CatalogEntry::from_record(rec).unwrap();
        assert_eq!(entry.display_name, "Vue starter");
        assert_eq!(entry.install_command.as_deref(), Some("npm install"));
        assert_eq!(entry.start_command, None);
        assert!(entry.supports(TemplateKind::Project));
        assert!(!entry.supports(TemplateKind::Component));
    }

    #[test]
    fn test_entry_serializes_in_wire_shape() {
        let entry = CatalogEntry::from_record(record("name: tpl-a\nversion: 1.0.0")).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["type"], "normal");
        assert_eq!(json["displayName"], "tpl-a");
    }
}
