//! Template catalog
//!
//! This module provides:
//! - Catalog entry types (CatalogEntry, Strategy, RequestedVersion)
//! - Catalog loading from a remote endpoint or a local file
//! - Filtering by template kind (project / component)
//!
//! Records that fail conversion are kept aside. They never show up in
//! listings, and selecting one by name reports its conversion error.

pub mod entry;
pub mod source;

pub use entry::{CatalogEntry, CatalogRecord, RequestedVersion, Strategy, TemplateKind};
pub use source::{parse_catalog, CatalogSource};

use crate::error::Result;
use tracing::warn;

/// Ordered list of installable templates
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    rejected: Vec<CatalogRecord>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            rejected: Vec::new(),
        }
    }

    /// Convert wire records, setting aside the ones that do not convert
    pub fn from_records(records: Vec<CatalogRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            match CatalogEntry::from_record(record.clone()) {
                Ok(entry) => catalog.entries.push(entry),
                Err(e) => {
                    warn!(template = %record.name, error = %e, "skipping catalog record");
                    catalog.rejected.push(record);
                }
            }
        }
        catalog
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by package name
    pub fn find(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Names of records that failed conversion
    pub fn rejected(&self) -> impl Iterator<Item = &str> {
        self.rejected.iter().map(|r| r.name.as_str())
    }

    /// Pick an entry by name for a run
    ///
    /// Unlike `find`, a rejected record surfaces its conversion error
    /// (`UnknownStrategy`, `InvalidVersion`) instead of looking absent.
    pub fn select(&self, name: &str) -> Result<Option<&CatalogEntry>> {
        if let Some(entry) = self.find(name) {
            return Ok(Some(entry));
        }
        match self.rejected.iter().find(|r| r.name == name) {
            Some(record) => CatalogEntry::from_record(record.clone()).map(|_| None),
            None => Ok(None),
        }
    }

    /// Entries usable for the given kind, in catalog order
    pub fn for_kind(&self, kind: TemplateKind) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| e.supports(kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_keeps_order() {
        let catalog = parse_catalog(
            "- name: a\n  tag: [project]\n- name: b\n  tag: [component]\n- name: c\n",
        )
        .unwrap();

        let projects: Vec<_> = catalog
            .for_kind(TemplateKind::Project)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(projects, vec!["a", "c"]);

        let components: Vec<_> = catalog
            .for_kind(TemplateKind::Component)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(components, vec!["b", "c"]);
    }

    #[test]
    fn test_select_surfaces_rejected_record() {
        let catalog =
            parse_catalog("- name: good\n  version: 1.0.0\n- name: future\n  type: remote\n")
                .unwrap();

        assert_eq!(catalog.select("good").unwrap().unwrap().name, "good");
        assert!(catalog.select("absent").unwrap().is_none());
        match catalog.select("future").unwrap_err() {
            crate::error::ScaffoldError::UnknownStrategy { template, value } => {
                assert_eq!(template, "future");
                assert_eq!(value, "remote");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_find_missing() {
        assert!(Catalog::default().find("nope").is_none());
    }
}
