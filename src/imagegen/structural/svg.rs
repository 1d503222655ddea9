//! Local SVG box-and-arrow rendering
//!
//! Layered left-to-right layout: a component's column is the length of the
//! longest connection path reaching it (bounded, so cycles terminate), and
//! components keep graph order within a column. No external renderer.

use crate::types::ArchitectureGraph;

const BOX_WIDTH: usize = 200;
const BOX_HEIGHT: usize = 64;
const COLUMN_GAP: usize = 110;
const ROW_GAP: usize = 40;
const MARGIN: usize = 40;
const TITLE_HEIGHT: usize = 40;

/// Column index per component, in component order
fn layers(graph: &ArchitectureGraph) -> Vec<usize> {
    let n = graph.components.len();
    let index = |id: &str| graph.components.iter().position(|c| c.id == id);
    let edges: Vec<(usize, usize)> = graph
        .connections
        .iter()
        .filter_map(|c| Some((index(&c.source)?, index(&c.target)?)))
        .filter(|(s, t)| s != t)
        .collect();

    let mut layer = vec![0usize; n];
    for _ in 0..n {
        let mut changed = false;
        for &(s, t) in &edges {
            let candidate = layer[s] + 1;
            if candidate > layer[t] && candidate < n {
                layer[t] = candidate;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    layer
}

/// Render the graph as a standalone SVG document.
pub fn render_svg(graph: &ArchitectureGraph) -> String {
    let layer = layers(graph);
    let columns = layer.iter().copied().max().map_or(1, |m| m + 1);

    let mut rows_in_column = vec![0usize; columns];
    let mut positions = Vec::with_capacity(graph.components.len());
    for &col in &layer {
        let row = rows_in_column[col];
        rows_in_column[col] += 1;
        let x = MARGIN + col * (BOX_WIDTH + COLUMN_GAP);
        let y = MARGIN + TITLE_HEIGHT + row * (BOX_HEIGHT + ROW_GAP);
        positions.push((x, y));
    }
    let max_rows = rows_in_column.iter().copied().max().unwrap_or(0).max(1);

    let width = MARGIN * 2 + columns * BOX_WIDTH + columns.saturating_sub(1) * COLUMN_GAP;
    let height = MARGIN * 2 + TITLE_HEIGHT + max_rows * BOX_HEIGHT + (max_rows - 1) * ROW_GAP;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"Helvetica, Arial, sans-serif\">\n",
        w = width,
        h = height
    ));
    svg.push_str(
        "  <defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"#475569\"/></marker></defs>\n",
    );
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"#f8fafc\"/>\n",
        width, height
    ));

    let title = graph.system_summary.as_deref().unwrap_or("Architecture");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"16\" font-weight=\"bold\" fill=\"#0f172a\">{}</text>\n",
        MARGIN,
        MARGIN + 8,
        escape(&shorten(title, 90))
    ));

    let index = |id: &str| graph.components.iter().position(|c| c.id == id);
    for connection in &graph.connections {
        let (Some(s), Some(t)) = (index(&connection.source), index(&connection.target)) else {
            continue;
        };
        let (sx, sy) = positions[s];
        let (tx, ty) = positions[t];
        let (x1, y1, x2, y2) = if s == t {
            (sx + BOX_WIDTH / 2, sy, sx + BOX_WIDTH / 2 + 30, sy)
        } else if layer[t] > layer[s] {
            (sx + BOX_WIDTH, sy + BOX_HEIGHT / 2, tx, ty + BOX_HEIGHT / 2)
        } else {
            (sx, sy + BOX_HEIGHT / 2, tx + BOX_WIDTH, ty + BOX_HEIGHT / 2)
        };
        svg.push_str(&format!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#475569\" stroke-width=\"1.5\" marker-end=\"url(#arrow)\"/>\n",
            x1, y1, x2, y2
        ));
        if !connection.label.is_empty() {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" font-size=\"11\" text-anchor=\"middle\" fill=\"#334155\">{}</text>\n",
                (x1 + x2) / 2,
                (y1 + y2) / 2 - 6,
                escape(&shorten(&connection.label, 28))
            ));
        }
    }

    for (component, &(x, y)) in graph.components.iter().zip(&positions) {
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"10\" fill=\"#ffffff\" stroke=\"#2563eb\" stroke-width=\"2\"/>\n",
            x, y, BOX_WIDTH, BOX_HEIGHT
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" font-weight=\"bold\" text-anchor=\"middle\" fill=\"#0f172a\">{}</text>\n",
            x + BOX_WIDTH / 2,
            y + 28,
            escape(&shorten(&component.name, 24))
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"11\" text-anchor=\"middle\" fill=\"#64748b\">{}</text>\n",
            x + BOX_WIDTH / 2,
            y + 48,
            component.kind
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn shorten(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, ComponentKind, Connection, ImageFormat};

    fn chain_graph() -> ArchitectureGraph {
        ArchitectureGraph {
            system_summary: Some("Orders & <billing>".to_string()),
            components: vec![
                Component::new("web", "Web", ComponentKind::Frontend, ""),
                Component::new("api", "API", ComponentKind::Api, ""),
                Component::new("db", "DB", ComponentKind::Database, ""),
            ],
            connections: vec![
                Connection::new("web", "api", "REST"),
                Connection::new("api", "db", "SQL"),
                Connection::new("db", "web", "cycle"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_layers_follow_flow_and_terminate_on_cycles() {
        let layer = layers(&chain_graph());
        assert_eq!(layer.len(), 3);
        assert!(layer.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_svg_is_escaped_and_sniffable() {
        let svg = render_svg(&chain_graph());
        assert!(svg.contains("Orders &amp; &lt;billing&gt;"));
        assert!(svg.contains(">API<"));
        assert_eq!(svg.matches("<line ").count(), 3);
        assert_eq!(ImageFormat::sniff(svg.as_bytes()), Some(ImageFormat::Svg));
    }

    #[test]
    fn test_svg_deterministic() {
        assert_eq!(render_svg(&chain_graph()), render_svg(&chain_graph()));
    }

    #[test]
    fn test_empty_graph_still_renders() {
        let svg = render_svg(&ArchitectureGraph::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
