//! Architecture Graph
//!
//! The structured description of a repository that the analyzer asks the
//! model for. The JSON reader is lenient about key names (`label`/`role`,
//! `from`/`to`) so that both the canonical schema and older cached files load.
//!
//! A graph is only handed to later stages after [`ArchitectureGraph::normalize`],
//! which guarantees at least one component and no dangling connections.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

// =============================================================================
// Component Kind
// =============================================================================

/// Closed set of component categories; unknown values read as `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ComponentKind {
    Frontend,
    Backend,
    Api,
    Database,
    Queue,
    Cache,
    Worker,
    Cli,
    AiModel,
    ExternalService,
    Storage,
    #[default]
    Other,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Api => "api",
            Self::Database => "database",
            Self::Queue => "queue",
            Self::Cache => "cache",
            Self::Worker => "worker",
            Self::Cli => "cli",
            Self::AiModel => "ai_model",
            Self::ExternalService => "external_service",
            Self::Storage => "storage",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "frontend" | "ui" | "web" => Ok(Self::Frontend),
            "backend" | "server" | "service" => Ok(Self::Backend),
            "api" | "gateway" => Ok(Self::Api),
            "database" | "db" => Ok(Self::Database),
            "queue" | "broker" => Ok(Self::Queue),
            "cache" => Ok(Self::Cache),
            "worker" | "job" => Ok(Self::Worker),
            "cli" => Ok(Self::Cli),
            "ai_model" | "ai" | "llm" | "model" => Ok(Self::AiModel),
            "external_service" | "external" | "third_party" => Ok(Self::ExternalService),
            "storage" | "blob" => Ok(Self::Storage),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown component type: {}", s)),
        }
    }
}

impl From<String> for ComponentKind {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Self::Other)
    }
}

// =============================================================================
// Components & Connections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Stable identifier; derived from `name` during normalization when absent
    #[serde(default)]
    pub id: String,
    #[serde(alias = "label")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ComponentKind,
    #[serde(alias = "role", default)]
    pub description: String,
}

impl Component {
    pub fn new(id: &str, name: &str, kind: ComponentKind, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub target: String,
    #[serde(default = "default_connection_label")]
    pub label: String,
}

fn default_connection_label() -> String {
    "data flow".to_string()
}

impl Connection {
    pub fn new(source: &str, target: &str, label: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            label: label.to_string(),
        }
    }
}

// =============================================================================
// Architecture Graph
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_summary: Option<String>,
    /// Model-suggested visual style, consulted by the `auto` hero style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_hint: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphDefect {
    #[error("architecture has no components")]
    NoComponents,
}

impl ArchitectureGraph {
    /// Canonicalize ids and enforce the component/connection invariants.
    ///
    /// Components without a name are dropped. Missing ids are derived from the
    /// name and duplicates get a numeric suffix. Connection endpoints may name a
    /// component by id or by name; they are rewritten to the id, and
    /// connections whose endpoints don't resolve are dropped with a warning.
    pub fn normalize(mut self) -> Result<Self, GraphDefect> {
        let mut seen = HashSet::new();
        let mut components = Vec::with_capacity(self.components.len());

        for (idx, mut component) in self.components.into_iter().enumerate() {
            component.name = component.name.trim().to_string();
            component.description = component.description.trim().to_string();
            if component.name.is_empty() {
                warn!(index = idx, "Dropping unnamed component");
                continue;
            }

            let base = match slugify(&component.id) {
                s if s.is_empty() => slugify(&component.name),
                s => s,
            };
            let base = if base.is_empty() {
                format!("component_{}", idx + 1)
            } else {
                base
            };
            let mut id = base.clone();
            let mut suffix = 2;
            while !seen.insert(id.clone()) {
                id = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            component.id = id;
            components.push(component);
        }

        if components.is_empty() {
            return Err(GraphDefect::NoComponents);
        }

        let mut connections = Vec::with_capacity(self.connections.len());
        for mut connection in self.connections {
            let source = resolve(&components, &connection.source);
            let target = resolve(&components, &connection.target);
            match (source, target) {
                (Some(source), Some(target)) => {
                    connection.source = source.to_string();
                    connection.target = target.to_string();
                    connection.label = connection.label.trim().to_string();
                    if connection.label.is_empty() {
                        connection.label = default_connection_label();
                    }
                    connections.push(connection);
                }
                _ => warn!(
                    source = %connection.source,
                    target = %connection.target,
                    "Dropping connection to unknown component"
                ),
            }
        }

        self.components = components;
        self.connections = connections;
        self.system_summary = non_empty(self.system_summary);
        self.style_hint = non_empty(self.style_hint);
        Ok(self)
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Display name for a component id, falling back to the id itself
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.component(id).map(|c| c.name.as_str()).unwrap_or(id)
    }
}

fn resolve<'a>(components: &'a [Component], reference: &str) -> Option<&'a str> {
    let reference = reference.trim();
    components
        .iter()
        .find(|c| c.id == reference)
        .or_else(|| components.iter().find(|c| c.name == reference))
        .or_else(|| {
            let slug = slugify(reference);
            components.iter().find(|c| c.id == slug)
        })
        .map(|c| c.id.as_str())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Lowercase alphanumeric identifier with `_` separators
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
