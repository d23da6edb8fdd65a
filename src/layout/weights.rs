use std::collections::{HashMap, HashSet};

use crate::tree::KnowledgeNode;

/// Subtree size per node id, the node itself included.
pub type SubtreeWeights = HashMap<String, usize>;

pub fn compute_weights(root: &KnowledgeNode) -> SubtreeWeights {
    // `visited` is only populated in debug builds, where a repeated id trips the assertion.
    fn visit<'a>(
        node: &'a KnowledgeNode,
        weights: &mut SubtreeWeights,
        visited: &mut HashSet<&'a str>,
    ) -> usize {
        debug_assert!(
            visited.insert(node.id.as_str()),
            "node id `{}` reached twice; the tree must be acyclic with unique ids",
            node.id
        );

        let mut weight = 1;
        for child in &node.children {
            weight += visit(child, weights, visited);
        }
        weights.insert(node.id.clone(), weight);
        weight
    }

    let mut weights = SubtreeWeights::new();
    visit(root, &mut weights, &mut HashSet::new());
    weights
}
