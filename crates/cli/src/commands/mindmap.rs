//! Mind map command handler.

use super::print_json;
use clap::Args;
use docqa_agent::{AgentServices, Mindmap, MindmapAgent, MindmapNode, NodeKind};
use docqa_core::{config::AppConfig, AppResult};
use std::sync::Arc;

/// Generate a mind map of a document
#[derive(Args, Debug)]
pub struct MindmapCommand {
    /// Document id
    pub document: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl MindmapCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing mindmap command for '{}'", self.document);

        let agent = MindmapAgent::new(Arc::new(AgentServices::from_config(config)?));
        let map = agent.generate_for_document(&self.document).await?;

        if self.json {
            print_json(&serde_json::to_value(&map)?)
        } else {
            print!("{}", render_outline(&map));
            Ok(())
        }
    }
}

/// Indented outline: each node under the first edge that targets it.
fn render_outline(map: &Mindmap) -> String {
    let mut out = String::new();
    let roots = map
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Root || !map.edges.iter().any(|e| e.target == n.id));
    for root in roots {
        write_node(map, root, 0, &mut vec![root.id.as_str()], &mut out);
    }
    out
}

fn write_node<'a>(
    map: &'a Mindmap,
    node: &'a MindmapNode,
    depth: usize,
    path: &mut Vec<&'a str>,
    out: &mut String,
) {
    out.push_str(&"  ".repeat(depth));
    out.push_str("- ");
    out.push_str(&node.label);
    if let Some(description) = &node.description {
        out.push_str(": ");
        out.push_str(description);
    }
    out.push('\n');

    for edge in map.edges.iter().filter(|e| e.source == node.id) {
        // Cycles in model output
        if path.contains(&edge.target.as_str()) {
            continue;
        }
        if let Some(child) = map.nodes.iter().find(|n| n.id == edge.target) {
            path.push(child.id.as_str());
            write_node(map, child, depth + 1, path, out);
            path.pop();
        }
    }
}
