//! The owned context that keeps tree, layout, scene and selection consistent.

use glam::Vec2;
use tracing::{debug, info};

use crate::layout::{LayoutConfig, LayoutPositions, compute_layout};
use crate::scene::picking::{Camera, ViewportRect, pick, pointer_to_ndc};
use crate::scene::selection::{Selection, SelectionChanged, SelectionState};
use crate::scene::{SceneGraph, SyncReport};
use crate::tree::{KnowledgeNode, KnowledgeTree, NodeDraft, TreeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayoutTrigger {
    Startup,
    NodeAdded,
    TreeReplaced,
}

impl RelayoutTrigger {
    pub fn label(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::NodeAdded => "node_added",
            Self::TreeReplaced => "tree_replaced",
        }
    }
}

#[derive(Debug)]
pub struct Constellation {
    tree: KnowledgeTree,
    layout_config: LayoutConfig,
    positions: LayoutPositions,
    scene: SceneGraph,
    selection: Selection,
    notifications: Vec<SelectionChanged>,
    last_report: SyncReport,
}

impl Constellation {
    pub fn new(tree: KnowledgeTree, layout_config: LayoutConfig) -> Self {
        let mut constellation = Self {
            tree,
            layout_config,
            positions: LayoutPositions::new(),
            scene: SceneGraph::new(),
            selection: Selection::default(),
            notifications: Vec::new(),
            last_report: SyncReport::default(),
        };
        constellation.relayout(RelayoutTrigger::Startup);
        constellation
    }

    pub fn tree(&self) -> &KnowledgeTree {
        &self.tree
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn positions(&self) -> &LayoutPositions {
        &self.positions
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn selected_node(&self) -> Option<&KnowledgeNode> {
        self.selection
            .selected_id()
            .and_then(|node_id| self.tree.find(node_id))
    }

    pub fn last_report(&self) -> SyncReport {
        self.last_report
    }

    /// Weights, positions and primitives are rebuilt from scratch; selection is carried
    /// over only when its node still exists.
    pub fn relayout(&mut self, trigger: RelayoutTrigger) -> SyncReport {
        self.positions = compute_layout(self.tree.root(), &self.layout_config);
        let report = self.scene.sync(self.tree.root(), &self.positions);
        if let Some(change) = self.selection.reconcile(&mut self.scene) {
            self.notifications.push(change);
        }

        debug!(
            trigger = trigger.label(),
            generation = report.generation,
            bodies = report.bodies,
            edges = report.edges,
            released = report.released,
            skipped_edges = report.skipped_edges,
            "relayout completed"
        );
        self.last_report = report;
        report
    }

    pub fn append_child(&mut self, parent_id: &str, draft: NodeDraft) -> Result<String, TreeError> {
        let node_id = self.tree.append_child(parent_id, draft)?;
        info!(parent_id, node_id = %node_id, "node added");
        self.relayout(RelayoutTrigger::NodeAdded);
        Ok(node_id)
    }

    /// Notes are not drawn, so editing them does not trigger a relayout.
    pub fn set_notes(&mut self, node_id: &str, notes: impl Into<String>) -> Result<(), TreeError> {
        self.tree.set_notes(node_id, notes)?;
        debug!(node_id, "notes updated");
        Ok(())
    }

    pub fn replace_tree(&mut self, tree: KnowledgeTree) -> SyncReport {
        self.tree = tree;
        self.relayout(RelayoutTrigger::TreeReplaced)
    }

    /// Returns `true` when the selection transitioned.
    pub fn select(&mut self, node_id: Option<&str>) -> bool {
        match self.selection.select(node_id, &mut self.scene) {
            Some(change) => {
                self.notifications.push(change);
                true
            }
            None => false,
        }
    }

    /// Picks under a raw pointer-down position and selects the hit node.
    /// A miss leaves the current selection untouched.
    pub fn pointer_down(
        &mut self,
        pointer: Vec2,
        viewport: &ViewportRect,
        camera: &Camera,
    ) -> Option<String> {
        let ndc = pointer_to_ndc(pointer, viewport)?;
        let node_id = pick(ndc, camera, &self.scene)?;
        self.select(Some(node_id.as_str()));
        Some(node_id)
    }

    pub fn drain_notifications(&mut self) -> Vec<SelectionChanged> {
        std::mem::take(&mut self.notifications)
    }
}
