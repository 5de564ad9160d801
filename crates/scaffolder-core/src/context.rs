//! Render context handed to every template file

use crate::catalog::TemplateKind;
use crate::version::parse_version;
use anyhow::Result;
use heck::ToKebabCase;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Flat string-to-string substitution data, read-only during rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderContext(BTreeMap<String, String>);

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for RenderContext {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Answers collected from the user for one init run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub kind: TemplateKind,
    pub name: String,
    pub version: String,
    /// Required for components, ignored for projects
    pub description: Option<String>,
    /// Package name of the chosen template
    pub template: String,
}

impl ProjectInfo {
    /// Validate the answers and build the render context
    pub fn into_render_context(self) -> Result<RenderContext> {
        if !is_valid_name(&self.name) {
            anyhow::bail!("Invalid {} name: '{}'", self.kind.as_str(), self.name);
        }
        let version = parse_version(&self.version)?.to_string();

        let mut context = RenderContext::new();
        context.insert("type", self.kind.as_str());
        context.insert("projectName", self.name.clone());
        context.insert("name", self.name.clone());
        context.insert("className", class_name(&self.name));
        context.insert("projectVersion", version.clone());
        context.insert("version", version);
        context.insert("projectTemplate", self.template);

        if self.kind == TemplateKind::Component {
            let description = self
                .description
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("A component needs a description"))?;
            context.insert("componentDescription", description.clone());
            context.insert("description", description);
        }

        Ok(context)
    }
}

fn name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(@[a-zA-Z0-9-_]+/)?[a-zA-Z]+([-][a-zA-Z][a-zA-Z0-9]*|[_][a-zA-Z][a-zA-Z0-9]*|[a-zA-Z0-9])*$",
            )
            .ok()
        })
        .as_ref()
}

/// Names start with a letter, end with a letter or digit, and only use `-`/`_`
/// as single separators; an npm scope prefix is allowed
pub fn is_valid_name(name: &str) -> bool {
    name_pattern().is_some_and(|pattern| pattern.is_match(name))
}

/// Kebab-case identifier derived from the project name (scope dropped)
pub fn class_name(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.to_kebab_case()
}
