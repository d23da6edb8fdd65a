//! Visual primitives for the constellation and their lifecycle.
//!
//! [`SceneGraph::sync`] is a full rebuild: every body, label and edge from the
//! previous pass is released before the new set is created, and the id index is
//! rebuilt alongside. Primitive handles are generational [`slotmap`] keys, so a
//! handle kept from a superseded pass resolves to nothing rather than to a
//! recycled primitive.

use std::collections::HashMap;

use eframe::egui::Color32;
use eframe::egui::ecolor::Hsva;
use glam::Vec3;
use slotmap::SlotMap;
use tracing::debug;

use crate::layout::LayoutPositions;
use crate::tree::KnowledgeNode;

pub mod picking;
pub mod selection;

pub const BASE_BODY_RADIUS: f32 = 3.2;
pub const BODY_RADIUS_STEP: f32 = 0.5;
pub const MIN_BODY_RADIUS: f32 = 1.2;
pub const LABEL_CLEARANCE: f32 = 1.5;
pub const DEPTH_HUE_CYCLE: usize = 6;

pub const BASE_EMISSIVE: f32 = 0.25;
pub const SELECTED_EMISSIVE: f32 = 0.9;
pub const SELECTED_SCALE: f32 = 1.2;

const EDGE_COLOR: Color32 = Color32::from_rgb(112, 132, 168);

slotmap::new_key_type! {
    pub struct BodyKey;
    pub struct LabelKey;
    pub struct EdgeKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Baseline,
    Selected,
}

impl Emphasis {
    pub fn scale(self) -> f32 {
        match self {
            Self::Baseline => 1.0,
            Self::Selected => SELECTED_SCALE,
        }
    }

    pub fn emissive(self) -> f32 {
        match self {
            Self::Baseline => BASE_EMISSIVE,
            Self::Selected => SELECTED_EMISSIVE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub node_id: String,
    pub depth: usize,
    pub center: Vec3,
    pub radius: f32,
    pub color: Color32,
    pub scale: f32,
    pub emissive: f32,
}

impl Body {
    /// Radius as drawn and hit-tested, emphasis scale included.
    pub fn effective_radius(&self) -> f32 {
        self.radius * self.scale
    }

    pub fn is_emphasized(&self) -> bool {
        self.scale > 1.0
    }

    fn apply(&mut self, emphasis: Emphasis) {
        self.scale = emphasis.scale();
        self.emissive = emphasis.emissive();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub node_id: String,
    pub text: String,
    pub anchor: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub parent_id: String,
    pub child_id: String,
    pub from: Vec3,
    pub to: Vec3,
    pub color: Color32,
}

/// The primitives owned by one live node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeVisual {
    pub body: BodyKey,
    pub label: LabelKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub generation: u64,
    pub bodies: usize,
    pub labels: usize,
    pub edges: usize,
    pub released: usize,
    pub skipped_edges: usize,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    bodies: SlotMap<BodyKey, Body>,
    labels: SlotMap<LabelKey, Label>,
    edges: SlotMap<EdgeKey, Edge>,
    index: HashMap<String, NodeVisual>,
    generation: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every primitive with a fresh set built from `root` and `positions`.
    pub fn sync(&mut self, root: &KnowledgeNode, positions: &LayoutPositions) -> SyncReport {
        let released = self.dispose();
        self.generation += 1;

        let mut links = Vec::new();
        self.create_node_primitives(root, None, positions, &mut links);

        let mut skipped_edges = 0;
        for (parent_id, child_id) in links {
            let endpoints = self
                .body_for(parent_id)
                .zip(self.body_for(child_id))
                .map(|(parent, child)| (parent.center, child.center));
            let Some((from, to)) = endpoints else {
                debug!(parent_id, child_id, "skipping edge with a missing endpoint");
                skipped_edges += 1;
                continue;
            };
            self.edges.insert(Edge {
                parent_id: parent_id.to_owned(),
                child_id: child_id.to_owned(),
                from,
                to,
                color: EDGE_COLOR,
            });
        }

        SyncReport {
            generation: self.generation,
            bodies: self.bodies.len(),
            labels: self.labels.len(),
            edges: self.edges.len(),
            released,
            skipped_edges,
        }
    }

    fn create_node_primitives<'a>(
        &mut self,
        node: &'a KnowledgeNode,
        parent_id: Option<&'a str>,
        positions: &LayoutPositions,
        links: &mut Vec<(&'a str, &'a str)>,
    ) {
        if let Some(parent_id) = parent_id {
            links.push((parent_id, node.id.as_str()));
        }

        if let Some(position) = positions.get(&node.id) {
            let radius = body_radius(position.depth);
            let body = self.bodies.insert(Body {
                node_id: node.id.clone(),
                depth: position.depth,
                center: position.position,
                radius,
                color: depth_color(position.depth),
                scale: Emphasis::Baseline.scale(),
                emissive: Emphasis::Baseline.emissive(),
            });
            let label = self.labels.insert(Label {
                node_id: node.id.clone(),
                text: node.title.clone(),
                anchor: position.position + Vec3::Y * (radius + LABEL_CLEARANCE),
            });
            self.index
                .insert(node.id.clone(), NodeVisual { body, label });
        } else {
            debug!(node_id = %node.id, "node has no layout position; no primitives created");
        }

        for child in &node.children {
            self.create_node_primitives(child, Some(node.id.as_str()), positions, links);
        }
    }

    /// Releases every primitive and clears the index. Returns the number released.
    pub fn dispose(&mut self) -> usize {
        let released = self.bodies.len() + self.labels.len() + self.edges.len();
        self.bodies.clear();
        self.labels.clear();
        self.edges.clear();
        self.index.clear();
        released
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = (LabelKey, &Label)> {
        self.labels.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &Edge)> {
        self.edges.iter()
    }

    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    pub fn label(&self, key: LabelKey) -> Option<&Label> {
        self.labels.get(key)
    }

    pub fn visual(&self, node_id: &str) -> Option<NodeVisual> {
        self.index.get(node_id).copied()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    pub fn body_for(&self, node_id: &str) -> Option<&Body> {
        self.visual(node_id).and_then(|visual| self.bodies.get(visual.body))
    }

    /// Returns `false` when `node_id` has no live body.
    pub(crate) fn set_emphasis(&mut self, node_id: &str, emphasis: Emphasis) -> bool {
        let Some(visual) = self.index.get(node_id) else {
            return false;
        };
        match self.bodies.get_mut(visual.body) {
            Some(body) => {
                body.apply(emphasis);
                true
            }
            None => false,
        }
    }
}

pub fn body_radius(depth: usize) -> f32 {
    (BASE_BODY_RADIUS - depth as f32 * BODY_RADIUS_STEP).max(MIN_BODY_RADIUS)
}

pub fn depth_color(depth: usize) -> Color32 {
    let hue = (depth % DEPTH_HUE_CYCLE) as f32 / DEPTH_HUE_CYCLE as f32;
    Color32::from(Hsva::new(hue, 0.62, 0.95, 1.0))
}
