use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub children: Vec<KnowledgeNode>,
}

impl KnowledgeNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            tags: Vec::new(),
            notes: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<KnowledgeNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// User-supplied fields for a node that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeDraft {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl NodeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn into_node(self) -> Result<KnowledgeNode, TreeError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(TreeError::EmptyTitle);
        }

        Ok(KnowledgeNode {
            id: Uuid::new_v4().to_string(),
            title,
            description: self.description.trim().to_owned(),
            tags: self
                .tags
                .into_iter()
                .map(|tag| tag.trim().to_owned())
                .filter(|tag| !tag.is_empty())
                .collect(),
            notes: String::new(),
            children: Vec::new(),
        })
    }
}

/// Deepest level a node may sit at. Each level nests two JSON containers, so this keeps
/// every stored tree well inside the parser recursion limit.
pub const MAX_TREE_DEPTH: usize = 48;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node `{node_id}`")]
    UnknownNode { node_id: String },

    #[error("duplicate node id `{node_id}`")]
    DuplicateId { node_id: String },

    #[error("node title cannot be empty")]
    EmptyTitle,

    #[error("tree is limited to {max_depth} levels below the root")]
    TooDeep { max_depth: usize },
}

/// A node reached during a pre-order walk, with its depth and parent.
#[derive(Debug, Clone, Copy)]
pub struct TreeVisit<'a> {
    pub depth: usize,
    pub parent_id: Option<&'a str>,
    pub node: &'a KnowledgeNode,
}

/// The single mutable knowledge tree. Every mutation bumps `revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeTree {
    root: KnowledgeNode,
    revision: u64,
}

impl KnowledgeTree {
    pub fn new(root: KnowledgeNode) -> Result<Self, TreeError> {
        validate_unique_ids(&root)?;
        validate_depth(&root)?;
        Ok(Self { root, revision: 0 })
    }

    pub fn seeded() -> Self {
        let root = seed_node("Knowledge", "Everything worth remembering.").with_children(vec![
            seed_node("Science", "How the world works.").with_children(vec![
                seed_node("Physics", "Matter, energy and motion."),
                seed_node("Biology", "Living systems."),
            ]),
            seed_node("Humanities", "People and culture.")
                .with_children(vec![seed_node("History", "What happened and why.")]),
            seed_node("Technology", "Tools we build.").with_children(vec![
                seed_node("Programming", "Writing software.")
                    .with_children(vec![seed_node("Rust", "Systems programming language.")]),
            ]),
        ]);

        Self { root, revision: 0 }
    }

    pub fn root(&self) -> &KnowledgeNode {
        &self.root
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node_count(&self) -> usize {
        self.pre_order().len()
    }

    pub fn find(&self, node_id: &str) -> Option<&KnowledgeNode> {
        find_in(&self.root, node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.find(node_id).is_some()
    }

    /// Parents are always yielded before their children, siblings in stored order.
    pub fn pre_order(&self) -> Vec<TreeVisit<'_>> {
        fn walk<'a>(
            node: &'a KnowledgeNode,
            depth: usize,
            parent_id: Option<&'a str>,
            out: &mut Vec<TreeVisit<'a>>,
        ) {
            out.push(TreeVisit {
                depth,
                parent_id,
                node,
            });
            for child in &node.children {
                walk(child, depth + 1, Some(node.id.as_str()), out);
            }
        }

        let mut out = Vec::new();
        walk(&self.root, 0, None, &mut out);
        out
    }

    pub fn append_child(&mut self, parent_id: &str, draft: NodeDraft) -> Result<String, TreeError> {
        let node = draft.into_node()?;
        if self.contains(&node.id) {
            return Err(TreeError::DuplicateId { node_id: node.id });
        }

        let parent_depth = self
            .pre_order()
            .into_iter()
            .find(|visit| visit.node.id == parent_id)
            .map(|visit| visit.depth)
            .ok_or_else(|| TreeError::UnknownNode {
                node_id: parent_id.to_owned(),
            })?;
        if parent_depth >= MAX_TREE_DEPTH {
            return Err(TreeError::TooDeep {
                max_depth: MAX_TREE_DEPTH,
            });
        }

        let parent = find_in_mut(&mut self.root, parent_id).ok_or_else(|| TreeError::UnknownNode {
            node_id: parent_id.to_owned(),
        })?;
        let node_id = node.id.clone();
        parent.children.push(node);
        self.revision += 1;
        Ok(node_id)
    }

    pub fn set_notes(&mut self, node_id: &str, notes: impl Into<String>) -> Result<(), TreeError> {
        let node = find_in_mut(&mut self.root, node_id).ok_or_else(|| TreeError::UnknownNode {
            node_id: node_id.to_owned(),
        })?;
        node.notes = notes.into();
        self.revision += 1;
        Ok(())
    }
}

pub fn validate_unique_ids(root: &KnowledgeNode) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node.id.as_str()) {
            return Err(TreeError::DuplicateId {
                node_id: node.id.clone(),
            });
        }
        stack.extend(node.children.iter());
    }
    Ok(())
}

fn validate_depth(root: &KnowledgeNode) -> Result<(), TreeError> {
    let mut stack = vec![(root, 0_usize)];
    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_TREE_DEPTH {
            return Err(TreeError::TooDeep {
                max_depth: MAX_TREE_DEPTH,
            });
        }
        stack.extend(node.children.iter().map(|child| (child, depth + 1)));
    }
    Ok(())
}

fn find_in<'a>(node: &'a KnowledgeNode, node_id: &str) -> Option<&'a KnowledgeNode> {
    if node.id == node_id {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_in(child, node_id))
}

fn find_in_mut<'a>(node: &'a mut KnowledgeNode, node_id: &str) -> Option<&'a mut KnowledgeNode> {
    if node.id == node_id {
        return Some(node);
    }
    node.children
        .iter_mut()
        .find_map(|child| find_in_mut(child, node_id))
}

fn seed_node(title: &str, description: &str) -> KnowledgeNode {
    KnowledgeNode {
        description: description.to_owned(),
        ..KnowledgeNode::new(Uuid::new_v4().to_string(), title)
    }
}

#[cfg(test)]
mod tests {
    use super::{KnowledgeNode, KnowledgeTree, MAX_TREE_DEPTH, NodeDraft, TreeError};

    #[test]
    fn append_child_adds_node_under_parent_and_bumps_revision() {
        let mut tree = KnowledgeTree::new(sample_root()).expect("sample tree is valid");

        let draft = NodeDraft {
            title: "  Optics ".to_owned(),
            description: "light".to_owned(),
            tags: vec!["waves".to_owned(), "  ".to_owned(), " lenses ".to_owned()],
        };
        let new_id = tree.append_child("a", draft).expect("parent exists");

        let parent = tree.find("a").expect("parent should exist");
        assert_eq!(parent.children.len(), 3);
        let child = tree.find(&new_id).expect("child should exist");
        assert_eq!(child.title, "Optics");
        assert_eq!(child.tags, vec!["waves".to_owned(), "lenses".to_owned()]);
        assert_eq!(tree.revision(), 1);
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn append_child_rejects_unknown_parent_and_empty_title() {
        let mut tree = KnowledgeTree::new(sample_root()).expect("sample tree is valid");

        assert_eq!(
            tree.append_child("missing", NodeDraft::new("x")),
            Err(TreeError::UnknownNode {
                node_id: "missing".to_owned()
            })
        );
        assert_eq!(
            tree.append_child("root", NodeDraft::new("   ")),
            Err(TreeError::EmptyTitle)
        );
        assert_eq!(tree.revision(), 0);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn append_child_stops_at_the_depth_limit() {
        let mut tree = KnowledgeTree::new(sample_root()).expect("sample tree is valid");
        let mut parent = "b".to_owned();
        for level in 2..=MAX_TREE_DEPTH {
            parent = tree
                .append_child(&parent, NodeDraft::new(format!("level {level}")))
                .expect("chain stays within the limit");
        }
        let revision = tree.revision();

        assert_eq!(
            tree.append_child(&parent, NodeDraft::new("one too many")),
            Err(TreeError::TooDeep {
                max_depth: MAX_TREE_DEPTH
            })
        );
        assert_eq!(tree.revision(), revision);
    }

    #[test]
    fn new_rejects_trees_deeper_than_the_limit() {
        let mut node = KnowledgeNode::new("leaf", "Leaf");
        for level in (0..=MAX_TREE_DEPTH).rev() {
            node = KnowledgeNode::new(format!("n{level}"), "Level").with_children(vec![node]);
        }

        assert_eq!(
            KnowledgeTree::new(node),
            Err(TreeError::TooDeep {
                max_depth: MAX_TREE_DEPTH
            })
        );
    }

    #[test]
    fn set_notes_updates_only_the_target_node() {
        let mut tree = KnowledgeTree::new(sample_root()).expect("sample tree is valid");
        tree.set_notes("a2", "remember this").expect("node exists");

        assert_eq!(tree.find("a2").map(|node| node.notes.as_str()), Some("remember this"));
        assert_eq!(tree.find("a1").map(|node| node.notes.as_str()), Some(""));
        assert!(matches!(
            tree.set_notes("nope", "x"),
            Err(TreeError::UnknownNode { .. })
        ));
    }

    #[test]
    fn new_rejects_duplicate_ids_anywhere_in_the_tree() {
        let root = KnowledgeNode::new("root", "Root").with_children(vec![
            KnowledgeNode::new("a", "A").with_children(vec![KnowledgeNode::new("dup", "x")]),
            KnowledgeNode::new("b", "B").with_children(vec![KnowledgeNode::new("dup", "y")]),
        ]);

        assert_eq!(
            KnowledgeTree::new(root),
            Err(TreeError::DuplicateId {
                node_id: "dup".to_owned()
            })
        );
    }

    #[test]
    fn pre_order_visits_parents_before_children_with_depths() {
        let tree = KnowledgeTree::new(sample_root()).expect("sample tree is valid");
        let visits = tree
            .pre_order()
            .into_iter()
            .map(|visit| (visit.node.id.as_str(), visit.depth, visit.parent_id))
            .collect::<Vec<_>>();

        assert_eq!(
            visits,
            vec![
                ("root", 0, None),
                ("a", 1, Some("root")),
                ("a1", 2, Some("a")),
                ("a2", 2, Some("a")),
                ("b", 1, Some("root")),
            ]
        );
    }

    #[test]
    fn seeded_tree_has_unique_ids() {
        let tree = KnowledgeTree::seeded();
        assert!(super::validate_unique_ids(tree.root()).is_ok());
        assert!(tree.node_count() > 1);
    }

    fn sample_root() -> KnowledgeNode {
        KnowledgeNode::new("root", "Root").with_children(vec![
            KnowledgeNode::new("a", "A").with_children(vec![
                KnowledgeNode::new("a1", "A1"),
                KnowledgeNode::new("a2", "A2"),
            ]),
            KnowledgeNode::new("b", "B"),
        ])
    }
}
