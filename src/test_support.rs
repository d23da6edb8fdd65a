use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::tree::{KnowledgeNode, KnowledgeTree};

pub fn temp_path(prefix: &str) -> PathBuf {
    let now_ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "constellation_{prefix}_{}_{}",
        std::process::id(),
        now_ns
    ))
}

pub fn remove_dir_if_exists(path: &Path) {
    let _ = std::fs::remove_dir_all(path);
}

/// `root` -> (`a` -> (`a1`, `a2`), `b`): five nodes, four edges.
pub fn sample_root() -> KnowledgeNode {
    KnowledgeNode::new("root", "Root").with_children(vec![
        KnowledgeNode::new("a", "A").with_children(vec![
            KnowledgeNode::new("a1", "A1"),
            KnowledgeNode::new("a2", "A2"),
        ]),
        KnowledgeNode::new("b", "B"),
    ])
}

pub fn sample_tree() -> KnowledgeTree {
    match KnowledgeTree::new(sample_root()) {
        Ok(tree) => tree,
        Err(error) => panic!("sample tree must be valid: {error}"),
    }
}

/// A deeper, uneven tree for property checks.
pub fn wide_root() -> KnowledgeNode {
    KnowledgeNode::new("r", "R").with_children(vec![
        KnowledgeNode::new("x", "X").with_children(vec![
            KnowledgeNode::new("x1", "X1").with_children(vec![
                KnowledgeNode::new("x1a", "X1a"),
                KnowledgeNode::new("x1b", "X1b"),
                KnowledgeNode::new("x1c", "X1c"),
            ]),
            KnowledgeNode::new("x2", "X2"),
        ]),
        KnowledgeNode::new("y", "Y"),
        KnowledgeNode::new("z", "Z").with_children(vec![
            KnowledgeNode::new("z1", "Z1"),
            KnowledgeNode::new("z2", "Z2").with_children(vec![KnowledgeNode::new(
                "z2a", "Z2a",
            )]),
        ]),
    ])
}

pub fn approx_eq(left: f32, right: f32) -> bool {
    (left - right).abs() <= 1e-4 * left.abs().max(right.abs()).max(1.0)
}
