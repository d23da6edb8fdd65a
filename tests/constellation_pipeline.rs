use std::fs;

use constellation::commands;
use constellation::engine::Constellation;
use constellation::layout::{Jitter, LayoutConfig};
use constellation::scene::picking::{Camera, ViewportRect};
use constellation::scene::selection::{SelectionChanged, SelectionState};
use constellation::test_support::{remove_dir_if_exists, sample_tree, temp_path};
use constellation::tree::{KnowledgeNode, KnowledgeTree, NodeDraft};
use constellation::tree::store::TreeStore;
use glam::Vec2;

fn viewport() -> ViewportRect {
    ViewportRect::new(0.0, 0.0, 1600.0, 900.0)
}

fn camera() -> Camera {
    let mut camera = Camera::default();
    camera.set_viewport_size(1600.0, 900.0);
    camera
}

#[test]
fn clicking_a_body_selects_it_and_adding_a_child_keeps_the_selection() {
    let mut constellation = Constellation::new(sample_tree(), LayoutConfig::without_jitter());
    let camera = camera();
    let viewport = viewport();

    let root_center = constellation
        .scene()
        .body_for("root")
        .map(|body| body.center)
        .expect("root body");
    let ndc = camera.project(root_center).expect("root in front of camera");
    let pointer = viewport.ndc_to_screen(ndc.truncate());

    let picked = constellation.pointer_down(pointer, &viewport, &camera);
    assert_eq!(picked.as_deref(), Some("root"));
    assert_eq!(
        constellation.selection(),
        &SelectionState::Selected("root".to_string())
    );

    constellation
        .append_child("b", NodeDraft::new("B1"))
        .expect("append child");
    let report = constellation.last_report();
    assert_eq!(report.bodies, 6);
    assert_eq!(report.edges, 5);

    let body = constellation.scene().body_for("root").expect("root body");
    assert!(body.is_emphasized());
    assert_eq!(
        constellation.drain_notifications(),
        vec![SelectionChanged {
            node_id: Some("root".to_string())
        }]
    );
}

#[test]
fn clicking_empty_space_leaves_the_selection_alone() {
    let mut constellation = Constellation::new(sample_tree(), LayoutConfig::without_jitter());
    assert!(constellation.select(Some("a1")));

    let picked = constellation.pointer_down(Vec2::new(2.0, 2.0), &viewport(), &camera());

    assert_eq!(picked, None);
    assert_eq!(constellation.selected_node().map(|node| node.id.as_str()), Some("a1"));
}

#[test]
fn replacing_the_tree_clears_a_selection_whose_node_disappeared() {
    let mut constellation = Constellation::new(sample_tree(), LayoutConfig::without_jitter());
    assert!(constellation.select(Some("a2")));
    let _ = constellation.drain_notifications();

    let replacement =
        KnowledgeTree::new(KnowledgeNode::new("solo", "Solo")).expect("single node tree");
    constellation.replace_tree(replacement);

    assert_eq!(constellation.selection(), &SelectionState::Unselected);
    assert_eq!(
        constellation.drain_notifications(),
        vec![SelectionChanged { node_id: None }]
    );
    assert_eq!(constellation.scene().body_count(), 1);
    assert_eq!(constellation.scene().edge_count(), 0);
}

#[test]
fn stored_tree_survives_cli_edits_and_reloads_into_the_same_layout() {
    let dir = temp_path("pipeline");
    let store = TreeStore::new(dir.join("tree.json"));
    store.save(&sample_tree()).expect("save sample tree");

    let node_id = commands::add_node(
        &store,
        "a",
        NodeDraft {
            title: "A3".to_string(),
            description: "third leaf".to_string(),
            tags: vec!["new".to_string()],
        },
    )
    .expect("add node");
    commands::set_notes(&store, &node_id, "remember this").expect("set notes");

    let reloaded = store.load().expect("reload tree");
    let node = reloaded.find(&node_id).expect("added node persisted");
    assert_eq!(node.notes, "remember this");
    assert_eq!(node.tags, vec!["new".to_string()]);

    let config = LayoutConfig {
        jitter: Jitter::Seeded(11),
        ..LayoutConfig::default()
    };
    let first = commands::layout_rows(&reloaded, &config);
    let second = commands::layout_rows(&store.load().expect("reload again"), &config);
    assert_eq!(first, second);
    assert_eq!(first[0].weight, 6);

    assert!(fs::read_to_string(store.path()).is_ok_and(|raw| raw.contains("remember this")));
    remove_dir_if_exists(&dir);
}
