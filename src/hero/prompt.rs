//! Hero image prompt construction
//!
//! A pure function of the graph, the style, and the limits: the same inputs
//! always yield byte-identical text, which is what lets the image cache key
//! on [`ImagePrompt::digest`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::style::{StyleTemplate, kind_visual};
use crate::config::{HeroStyle, PromptConfig};
use crate::constants::prompt as limits;
use crate::types::{ArchitectureGraph, Component, Connection};

const DEFAULT_SUMMARY: &str = "a software system";
const ELISION_NOTE: &str =
    "Note: minor components and flows were omitted for clarity; show only what is listed.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePrompt {
    pub text: String,
    /// Style as requested
    pub style: HeroStyle,
    /// Template the style resolved to
    pub template: StyleTemplate,
    pub components_kept: usize,
    pub connections_kept: usize,
    pub truncated: bool,
}

impl ImagePrompt {
    /// SHA-256 hex of the prompt text
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.text.as_bytes()))
    }
}

/// Build the hero prompt for `graph`.
///
/// Keeps the first `max_components` components and the first
/// `max_connections` connections whose endpoints both survived. If the text
/// still exceeds `max_chars`, connections and then components are dropped
/// from the end; as a last resort the text is cut at a char boundary.
pub fn build_prompt(graph: &ArchitectureGraph, style: HeroStyle, config: &PromptConfig) -> ImagePrompt {
    let template = StyleTemplate::resolve(style, graph);

    let mut components: Vec<&Component> =
        graph.components.iter().take(config.max_components).collect();
    let mut connections = surviving_connections(graph, &components, config.max_connections);
    let mut truncated = components.len() < graph.components.len()
        || connections.len() < graph.connections.len();

    let mut text = render(graph, template, &components, &connections, truncated, config);

    while text.chars().count() > config.max_chars {
        if connections.pop().is_none() {
            if components.len() <= 1 {
                break;
            }
            components.pop();
            connections = surviving_connections(graph, &components, connections.len());
        }
        truncated = true;
        text = render(graph, template, &components, &connections, truncated, config);
    }

    if text.chars().count() > config.max_chars {
        text = text.chars().take(config.max_chars).collect();
        truncated = true;
    }

    ImagePrompt {
        text,
        style,
        template,
        components_kept: components.len(),
        connections_kept: connections.len(),
        truncated,
    }
}

fn surviving_connections<'a>(
    graph: &'a ArchitectureGraph,
    kept: &[&Component],
    cap: usize,
) -> Vec<&'a Connection> {
    let is_kept = |id: &str| kept.iter().any(|c| c.id == id);
    graph
        .connections
        .iter()
        .filter(|c| is_kept(&c.source) && is_kept(&c.target))
        .take(cap)
        .collect()
}

fn render(
    graph: &ArchitectureGraph,
    template: StyleTemplate,
    components: &[&Component],
    connections: &[&Connection],
    truncated: bool,
    config: &PromptConfig,
) -> String {
    let summary = graph.system_summary.as_deref().unwrap_or(DEFAULT_SUMMARY);
    let mut out = String::new();

    out.push_str(&format!(
        "{} of {}, with {} clearly labeled {} connected by arrows.\n",
        template.scene(),
        clip(summary, 60),
        components.len(),
        template.node_noun()
    ));
    if truncated {
        out.push_str(ELISION_NOTE);
        out.push('\n');
    }

    out.push_str(&format!(
        "\nSystem overview: {}\n\nPlatforms:\n",
        clip(summary, limits::MAX_SUMMARY_CHARS)
    ));
    for (i, component) in components.iter().enumerate() {
        let description = if component.description.is_empty() {
            "core system functionality"
        } else {
            component.description.as_str()
        };
        out.push_str(&format!(
            "Platform {} labeled \"{}\" (type: {}), shows {}, representing {}.\n",
            i + 1,
            component.name,
            component.kind,
            kind_visual(component.kind),
            clip(description.trim_end_matches('.'), limits::MAX_DESCRIPTION_CHARS)
        ));
    }

    if !connections.is_empty() {
        out.push_str("\nData flow:\n");
        for connection in connections {
            out.push_str(&format!(
                "An arrow from \"{}\" to \"{}\" labeled \"{}\".\n",
                graph.name_of(&connection.source),
                graph.name_of(&connection.target),
                connection.label
            ));
        }
    }

    out.push_str(&format!(
        "\nVisual style: {}, large crisp English labels on each element, clear arrows with short labels, wide horizontal layout suitable for a README banner, no random text, no extra shapes, no unreadable scribbles.",
        template.style_paragraph()
    ));
    if let Some(extra) = config.extra.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        out.push(' ');
        out.push_str(extra);
    }
    out
}

/// Truncate to `max` chars, marking the cut with an ellipsis
fn clip(value: &str, max: usize) -> String {
    let value = value.trim();
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}
