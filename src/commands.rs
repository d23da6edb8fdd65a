//! Non-interactive CLI operations against the stored tree.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::layout::{LayoutConfig, compute_layout};
use crate::tree::store::{TreeStore, import_tree};
use crate::tree::{KnowledgeTree, NodeDraft};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRow {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub weight: usize,
    pub angle: f32,
    pub radius: f32,
    pub span: [f32; 2],
    pub position: [f32; 3],
}

/// One row per node in pre-order.
pub fn layout_rows(tree: &KnowledgeTree, config: &LayoutConfig) -> Vec<LayoutRow> {
    let weights = crate::layout::compute_weights(tree.root());
    let positions = compute_layout(tree.root(), config);

    tree.pre_order()
        .into_iter()
        .filter_map(|visit| {
            let position = positions.get(&visit.node.id)?;
            Some(LayoutRow {
                id: visit.node.id.clone(),
                title: visit.node.title.clone(),
                depth: position.depth,
                weight: weights.get(&visit.node.id).copied().unwrap_or(1),
                angle: position.angle,
                radius: position.radius,
                span: [position.span.start, position.span.end],
                position: position.position.to_array(),
            })
        })
        .collect()
}

pub fn tree_outline(tree: &KnowledgeTree) -> String {
    let mut out = String::new();
    for visit in tree.pre_order() {
        let node = visit.node;
        let _ = write!(out, "{}- {} [{}]", "  ".repeat(visit.depth), node.title, node.id);
        if !node.tags.is_empty() {
            let _ = write!(out, " #{}", node.tags.join(" #"));
        }
        out.push('\n');
    }
    out
}

pub fn add_node(store: &TreeStore, parent_id: &str, draft: NodeDraft) -> Result<String> {
    let mut tree = store.load_or_seed()?;
    let node_id = tree
        .append_child(parent_id, draft)
        .with_context(|| format!("failed to add node under `{parent_id}`"))?;
    store.save(&tree)?;
    info!(parent_id, node_id = %node_id, "node added from CLI");
    Ok(node_id)
}

pub fn set_notes(store: &TreeStore, node_id: &str, notes: &str) -> Result<()> {
    let mut tree = store.load_or_seed()?;
    tree.set_notes(node_id, notes)
        .with_context(|| format!("failed to set notes on `{node_id}`"))?;
    store.save(&tree)
}

pub fn import(store: &TreeStore, source: &Path) -> Result<usize> {
    let tree = import_tree(source)?;
    store.save(&tree)?;
    info!(
        source = %source.display(),
        nodes = tree.node_count(),
        "tree imported"
    );
    Ok(tree.node_count())
}
