// Weighted radial layout.
//
// Every node owns a half-open angular span. The root gets the full circle; each
// node's span is cut into contiguous sub-spans for its children, in child order,
// with widths proportional to subtree weight. A node sits at the midpoint of its
// span on a ring whose radius depends only on depth.
//
// Angle, radius and vertical offset are deterministic. The horizontal jitter is a
// rendering perturbation only: it is recorded separately and never feeds back into
// span or radius math.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tree::KnowledgeNode;

pub mod weights;

pub use weights::{SubtreeWeights, compute_weights};

pub const DEFAULT_RADIUS_STEP: f32 = 18.0;
pub const DEFAULT_RADIUS_BASE: f32 = 10.0;
pub const DEFAULT_VERTICAL_FREQUENCY: f32 = 0.7;
pub const DEFAULT_VERTICAL_AMPLITUDE: f32 = 6.0;
pub const DEFAULT_JITTER_AMPLITUDE: f32 = 1.0;

/// Half-open angle interval `[start, end)` in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularSpan {
    pub start: f32,
    pub end: f32,
}

impl AngularSpan {
    pub const FULL: Self = Self {
        start: 0.0,
        end: TAU,
    };

    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f32 {
        (self.start + self.end) * 0.5
    }
}

/// Source of the horizontal jitter applied to non-root nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Jitter {
    Off,
    Seeded(u64),
    #[default]
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub radius_step: f32,
    pub radius_base: f32,
    pub vertical_frequency: f32,
    pub vertical_amplitude: f32,
    pub jitter: Jitter,
    /// Maximum absolute offset on each horizontal axis.
    pub jitter_amplitude: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius_step: DEFAULT_RADIUS_STEP,
            radius_base: DEFAULT_RADIUS_BASE,
            vertical_frequency: DEFAULT_VERTICAL_FREQUENCY,
            vertical_amplitude: DEFAULT_VERTICAL_AMPLITUDE,
            jitter: Jitter::default(),
            jitter_amplitude: DEFAULT_JITTER_AMPLITUDE,
        }
    }
}

impl LayoutConfig {
    pub fn without_jitter() -> Self {
        Self {
            jitter: Jitter::Off,
            ..Self::default()
        }
    }

    pub fn ring_radius(&self, depth: usize) -> f32 {
        if depth == 0 {
            0.0
        } else {
            depth as f32 * self.radius_step + self.radius_base
        }
    }

    pub fn vertical_offset(&self, depth: usize) -> f32 {
        (depth as f32 * self.vertical_frequency).sin() * self.vertical_amplitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPosition {
    pub depth: usize,
    pub span: AngularSpan,
    /// Placement angle: the span midpoint.
    pub angle: f32,
    pub radius: f32,
    /// Final coordinate, jitter included. `y` is up.
    pub position: Vec3,
    pub jitter: Vec3,
}

impl LayoutPosition {
    /// Coordinate with the jitter removed.
    pub fn anchor(&self) -> Vec3 {
        self.position - self.jitter
    }
}

pub type LayoutPositions = HashMap<String, LayoutPosition>;

/// Runs weights and placement in one pass.
pub fn compute_layout(root: &KnowledgeNode, config: &LayoutConfig) -> LayoutPositions {
    let weights = compute_weights(root);
    layout(root, &weights, config)
}

pub fn layout(
    root: &KnowledgeNode,
    weights: &SubtreeWeights,
    config: &LayoutConfig,
) -> LayoutPositions {
    let mut jitter = JitterSource::new(config);
    let mut positions = LayoutPositions::with_capacity(weights.len());
    place(
        root,
        0,
        AngularSpan::FULL,
        weights,
        config,
        &mut jitter,
        &mut positions,
    );
    positions
}

fn place(
    node: &KnowledgeNode,
    depth: usize,
    span: AngularSpan,
    weights: &SubtreeWeights,
    config: &LayoutConfig,
    jitter: &mut JitterSource,
    positions: &mut LayoutPositions,
) {
    let angle = span.midpoint();
    let radius = config.ring_radius(depth);
    let offset = if depth == 0 {
        Vec3::ZERO
    } else {
        jitter.sample()
    };
    let position = Vec3::new(
        radius * angle.cos(),
        config.vertical_offset(depth),
        radius * angle.sin(),
    ) + offset;

    positions.insert(
        node.id.clone(),
        LayoutPosition {
            depth,
            span,
            angle,
            radius,
            position,
            jitter: offset,
        },
    );

    if node.children.is_empty() {
        return;
    }

    let total = node
        .children
        .iter()
        .map(|child| weight_of(weights, child))
        .sum::<usize>() as f32;

    let mut cursor = span.start;
    let last = node.children.len() - 1;
    for (index, child) in node.children.iter().enumerate() {
        let fraction = weight_of(weights, child) as f32 / total;
        // The last child closes the span exactly so rounding never leaves a gap.
        let end = if index == last {
            span.end
        } else {
            cursor + span.width() * fraction
        };
        let child_span = AngularSpan { start: cursor, end };

        place(
            child,
            depth + 1,
            child_span,
            weights,
            config,
            jitter,
            positions,
        );
        cursor = end;
    }
}

fn weight_of(weights: &SubtreeWeights, node: &KnowledgeNode) -> usize {
    let weight = weights.get(&node.id).copied();
    debug_assert!(weight.is_some(), "missing weight for node `{}`", node.id);
    weight.unwrap_or(1)
}

struct JitterSource {
    rng: Option<StdRng>,
    amplitude: f32,
}

impl JitterSource {
    fn new(config: &LayoutConfig) -> Self {
        let rng = match config.jitter {
            _ if config.jitter_amplitude <= 0.0 => None,
            Jitter::Off => None,
            Jitter::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            Jitter::Random => Some(StdRng::from_entropy()),
        };
        Self {
            rng,
            amplitude: config.jitter_amplitude,
        }
    }

    fn sample(&mut self) -> Vec3 {
        let Some(rng) = self.rng.as_mut() else {
            return Vec3::ZERO;
        };
        let amplitude = self.amplitude;
        Vec3::new(
            rng.gen_range(-amplitude..=amplitude),
            0.0,
            rng.gen_range(-amplitude..=amplitude),
        )
    }
}
