//! Mermaid flowchart source for an architecture graph

use crate::types::ArchitectureGraph;

/// Words mermaid treats as syntax when used as a node id
const RESERVED: &[&str] = &["end", "graph", "subgraph", "style", "class", "click", "flowchart"];

/// Render `graph LR` source with rounded nodes and labeled edges.
pub fn to_mermaid(graph: &ArchitectureGraph) -> String {
    let mut lines = vec!["graph LR".to_string()];

    for component in &graph.components {
        lines.push(format!(
            "    {}(\"{}\")",
            node_id(&component.id),
            label(&component.name)
        ));
    }

    if !graph.connections.is_empty() {
        lines.push(String::new());
    }
    for connection in &graph.connections {
        let edge_label = label(&connection.label);
        if edge_label.is_empty() {
            lines.push(format!(
                "    {} --> {}",
                node_id(&connection.source),
                node_id(&connection.target)
            ));
        } else {
            lines.push(format!(
                "    {} -->|\"{}\"| {}",
                node_id(&connection.source),
                edge_label,
                node_id(&connection.target)
            ));
        }
    }

    lines.join("\n")
}

fn node_id(id: &str) -> String {
    let mut cleaned: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        cleaned.push_str("node");
    }
    if RESERVED.contains(&cleaned.to_ascii_lowercase().as_str()) {
        cleaned.push('_');
    }
    cleaned
}

/// Strip characters that terminate a quoted mermaid label
fn label(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '"' | '[' | ']' | '(' | ')' | '{' | '}' | '|' | '<' | '>'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, ComponentKind, Connection};

    #[test]
    fn test_mermaid_source() {
        let graph = ArchitectureGraph {
            components: vec![
                Component::new("web", "Web [UI]", ComponentKind::Frontend, ""),
                Component::new("end", "Backend", ComponentKind::Backend, ""),
            ],
            connections: vec![Connection::new("web", "end", "calls \"REST\"")],
            ..Default::default()
        };

        let source = to_mermaid(&graph);
        assert_eq!(
            source,
            "graph LR\n    web(\"Web UI\")\n    end_(\"Backend\")\n\n    web -->|\"calls REST\"| end_"
        );
    }
}
