use super::{Emphasis, SceneGraph};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(String),
}

impl SelectionState {
    pub fn selected_id(&self) -> Option<&str> {
        match self {
            Self::Unselected => None,
            Self::Selected(node_id) => Some(node_id.as_str()),
        }
    }
}

/// Emitted on every successful selection transition for the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged {
    pub node_id: Option<String>,
}

/// Keeps the single highlighted node and the body emphasis in agreement.
#[derive(Debug, Default)]
pub struct Selection {
    state: SelectionState,
}

impl Selection {
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.state.selected_id()
    }

    /// `Some(id)` without a live body is ignored, which covers ids made stale by a relayout.
    pub fn select(
        &mut self,
        node_id: Option<&str>,
        scene: &mut SceneGraph,
    ) -> Option<SelectionChanged> {
        match node_id {
            Some(node_id) => {
                if !scene.contains(node_id) {
                    return None;
                }
                if let SelectionState::Selected(previous) = &self.state
                    && previous != node_id
                {
                    scene.set_emphasis(previous, Emphasis::Baseline);
                }
                scene.set_emphasis(node_id, Emphasis::Selected);
                self.state = SelectionState::Selected(node_id.to_owned());
                Some(SelectionChanged {
                    node_id: Some(node_id.to_owned()),
                })
            }
            None => {
                let SelectionState::Selected(previous) = &self.state else {
                    return None;
                };
                scene.set_emphasis(previous, Emphasis::Baseline);
                self.state = SelectionState::Unselected;
                Some(SelectionChanged { node_id: None })
            }
        }
    }

    /// Re-applies emphasis after a rebuild, or drops a selection whose node is gone.
    pub fn reconcile(&mut self, scene: &mut SceneGraph) -> Option<SelectionChanged> {
        let SelectionState::Selected(node_id) = &self.state else {
            return None;
        };
        if scene.set_emphasis(node_id, Emphasis::Selected) {
            return None;
        }
        self.state = SelectionState::Unselected;
        Some(SelectionChanged { node_id: None })
    }
}

#[cfg(test)]
mod tests {
    use crate::layout::{LayoutConfig, compute_layout};
    use crate::scene::{BASE_EMISSIVE, SELECTED_EMISSIVE, SELECTED_SCALE, SceneGraph};
    use crate::test_support::sample_root;
    use crate::tree::KnowledgeNode;

    use super::{Selection, SelectionChanged, SelectionState};

    #[test]
    fn selecting_a_node_emphasizes_only_that_body() {
        let mut scene = synced_scene();
        let mut selection = Selection::default();

        let event = selection.select(Some("a"), &mut scene);

        assert_eq!(
            event,
            Some(SelectionChanged {
                node_id: Some("a".to_owned())
            })
        );
        let body = scene.body_for("a").expect("a has a body");
        assert_eq!(body.scale, SELECTED_SCALE);
        assert_eq!(body.emissive, SELECTED_EMISSIVE);
        assert_emphasis_matches(&scene, &selection);
    }

    #[test]
    fn switching_selection_restores_previous_body() {
        let mut scene = synced_scene();
        let mut selection = Selection::default();
        selection.select(Some("a"), &mut scene);
        selection.select(Some("b"), &mut scene);

        let previous = scene.body_for("a").expect("a has a body");
        assert_eq!(previous.scale, 1.0);
        assert_eq!(previous.emissive, BASE_EMISSIVE);
        assert_eq!(selection.selected_id(), Some("b"));
        assert_emphasis_matches(&scene, &selection);
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut scene = synced_scene();
        let mut selection = Selection::default();
        selection.select(Some("a"), &mut scene);

        assert_eq!(selection.select(Some("ghost"), &mut scene), None);
        assert_eq!(selection.selected_id(), Some("a"));
        assert_emphasis_matches(&scene, &selection);
    }

    #[test]
    fn clearing_selection_restores_and_reports_once() {
        let mut scene = synced_scene();
        let mut selection = Selection::default();
        selection.select(Some("a1"), &mut scene);

        assert_eq!(
            selection.select(None, &mut scene),
            Some(SelectionChanged { node_id: None })
        );
        assert_eq!(selection.state(), &SelectionState::Unselected);
        assert_eq!(selection.select(None, &mut scene), None);
        assert_emphasis_matches(&scene, &selection);
    }

    #[test]
    fn any_sequence_leaves_at_most_one_emphasized_body() {
        let mut scene = synced_scene();
        let mut selection = Selection::default();
        let steps = [
            Some("a"),
            Some("a"),
            Some("b"),
            None,
            Some("ghost"),
            Some("a2"),
            Some("root"),
            Some("a1"),
            None,
            Some("b"),
        ];

        for step in steps {
            selection.select(step, &mut scene);
            assert_emphasis_matches(&scene, &selection);
        }
    }

    #[test]
    fn reconcile_keeps_surviving_selection_and_drops_missing_one() {
        let root = sample_root();
        let mut scene = synced_scene();
        let mut selection = Selection::default();
        selection.select(Some("a2"), &mut scene);

        scene.sync(&root, &compute_layout(&root, &LayoutConfig::without_jitter()));
        assert_eq!(selection.reconcile(&mut scene), None);
        assert_eq!(selection.selected_id(), Some("a2"));
        assert_emphasis_matches(&scene, &selection);

        let pruned = KnowledgeNode::new("root", "Root");
        scene.sync(&pruned, &compute_layout(&pruned, &LayoutConfig::without_jitter()));
        assert_eq!(
            selection.reconcile(&mut scene),
            Some(SelectionChanged { node_id: None })
        );
        assert_eq!(selection.selected_id(), None);
        assert_emphasis_matches(&scene, &selection);
    }

    fn synced_scene() -> SceneGraph {
        let root = sample_root();
        let mut scene = SceneGraph::new();
        scene.sync(&root, &compute_layout(&root, &LayoutConfig::without_jitter()));
        scene
    }

    fn assert_emphasis_matches(scene: &SceneGraph, selection: &Selection) {
        let emphasized = scene
            .bodies()
            .filter(|(_, body)| body.is_emphasized())
            .map(|(_, body)| body.node_id.as_str())
            .collect::<Vec<_>>();
        match selection.selected_id() {
            Some(node_id) => assert_eq!(emphasized, vec![node_id]),
            None => assert!(emphasized.is_empty(), "unexpected emphasis: {emphasized:?}"),
        }
    }
}
