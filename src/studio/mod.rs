use std::path::PathBuf;

use anyhow::{Context, Result};
use eframe::egui;
use glam::Vec2;
use tokio::runtime::Handle;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::config::ConstellationSettings;
use crate::engine::Constellation;
use crate::scene::picking::Camera;
use crate::tree::store::{TreeSaveHandle, TreeStore, spawn_tree_save_worker};
use crate::tree::{KnowledgeNode, NodeDraft};

pub mod canvas;
pub mod events;

use self::canvas::{paint_constellation, viewport_from_rect};
use self::events::{StudioAction, parse_tags};

const APP_TITLE: &str = "constellation";

/// Runs the window on the current thread, then flushes any pending save before returning.
pub async fn run_studio(settings: &ConstellationSettings) -> Result<()> {
    let runtime_handle = Handle::try_current().context("studio requires a tokio runtime")?;
    let store = TreeStore::new(settings.tree_path.clone());
    let tree = store
        .load_or_seed()
        .context("failed to load knowledge tree for studio")?;
    let save_worker = spawn_tree_save_worker(
        &runtime_handle,
        store.clone(),
        Duration::from_millis(settings.save_debounce_ms),
    );

    info!(
        tree_path = %settings.tree_path.display(),
        nodes = tree.node_count(),
        "starting constellation studio"
    );

    let engine = Constellation::new(tree, settings.layout_config());
    let tree_path = settings.tree_path.clone();
    let save_handle = save_worker.handle();
    let ui_result = tokio::task::block_in_place(|| {
        eframe::run_native(
            APP_TITLE,
            eframe::NativeOptions::default(),
            Box::new(move |_cc| {
                Ok(Box::new(StudioApp::new(
                    StudioState::new(engine, Some(save_handle)),
                    tree_path,
                )))
            }),
        )
    });

    save_worker.shutdown().await;
    debug!("tree save worker stopped");
    ui_result.map_err(|error| anyhow::anyhow!("studio UI exited with error: {error}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ChildForm {
    title: String,
    description: String,
    tags: String,
}

/// Everything the studio shows besides the camera, kept free of egui so it can be driven in tests.
pub struct StudioState {
    engine: Constellation,
    save_handle: Option<TreeSaveHandle>,
    notes_buffer: String,
    child_form: ChildForm,
    status: String,
}

impl StudioState {
    pub fn new(engine: Constellation, save_handle: Option<TreeSaveHandle>) -> Self {
        Self {
            engine,
            save_handle,
            notes_buffer: String::new(),
            child_form: ChildForm::default(),
            status: "Ready".to_owned(),
        }
    }

    pub fn engine(&self) -> &Constellation {
        &self.engine
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn notes_buffer(&self) -> &str {
        &self.notes_buffer
    }

    pub fn apply(&mut self, action: StudioAction) {
        match action {
            StudioAction::Select { node_id } => {
                self.engine.select(node_id.as_deref());
            }
            StudioAction::AddChild { parent_id, draft } => {
                match self.engine.append_child(&parent_id, draft) {
                    Ok(node_id) => {
                        self.child_form = ChildForm::default();
                        self.status = format!(
                            "Added node ({} nodes)",
                            self.engine.tree().node_count()
                        );
                        self.request_save();
                        debug!(node_id = %node_id, "child form submitted");
                    }
                    Err(error) => {
                        self.status = format!("Could not add node: {error}");
                    }
                }
            }
            StudioAction::SaveNotes { node_id, notes } => {
                match self.engine.set_notes(&node_id, notes) {
                    Ok(()) => {
                        self.status = "Notes saved".to_owned();
                        self.request_save();
                    }
                    Err(error) => {
                        self.status = format!("Could not save notes: {error}");
                    }
                }
            }
        }
        self.apply_notifications();
    }

    /// Refreshes the detail panel for every selection transition the engine reported.
    fn apply_notifications(&mut self) {
        for change in self.engine.drain_notifications() {
            self.notes_buffer = change
                .node_id
                .as_deref()
                .and_then(|node_id| self.engine.tree().find(node_id))
                .map(|node| node.notes.clone())
                .unwrap_or_default();
            debug!(node_id = ?change.node_id, "selection changed");
        }
    }

    fn request_save(&self) {
        if let Some(handle) = &self.save_handle {
            handle.request_save(self.engine.tree());
        }
    }

    fn render_detail_pane(&mut self, ui: &mut egui::Ui, actions: &mut Vec<StudioAction>) {
        ui.heading("Node");
        ui.label(format!("Status: {}", self.status));
        ui.separator();

        let Some(node) = self.engine.selected_node() else {
            ui.label("Click a node in the constellation to inspect it.");
            return;
        };
        let node = node.clone();
        render_node_summary(ui, &node);

        ui.separator();
        ui.label(egui::RichText::new("Notes").strong());
        ui.add(
            egui::TextEdit::multiline(&mut self.notes_buffer)
                .hint_text("Write notes for this node...")
                .desired_rows(6),
        );
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.notes_buffer != node.notes, egui::Button::new("Save notes"))
                .clicked()
            {
                actions.push(StudioAction::SaveNotes {
                    node_id: node.id.clone(),
                    notes: self.notes_buffer.clone(),
                });
            }
            if ui.button("Deselect").clicked() {
                actions.push(StudioAction::Select { node_id: None });
            }
        });

        ui.separator();
        ui.label(egui::RichText::new("Add child").strong());
        ui.add(egui::TextEdit::singleline(&mut self.child_form.title).hint_text("Title"));
        ui.add(
            egui::TextEdit::multiline(&mut self.child_form.description)
                .hint_text("Description")
                .desired_rows(2),
        );
        ui.add(
            egui::TextEdit::singleline(&mut self.child_form.tags)
                .hint_text("Tags, comma separated"),
        );
        let can_add = !self.child_form.title.trim().is_empty();
        if ui
            .add_enabled(can_add, egui::Button::new("Add child"))
            .clicked()
        {
            actions.push(StudioAction::AddChild {
                parent_id: node.id.clone(),
                draft: NodeDraft {
                    title: self.child_form.title.clone(),
                    description: self.child_form.description.clone(),
                    tags: parse_tags(&self.child_form.tags),
                },
            });
        }
    }
}

fn render_node_summary(ui: &mut egui::Ui, node: &KnowledgeNode) {
    ui.label(egui::RichText::new(&node.title).size(18.0).strong());
    if !node.description.is_empty() {
        ui.label(&node.description);
    }
    if node.tags.is_empty() {
        ui.label("Tags: none");
    } else {
        ui.label(format!("Tags: {}", node.tags.join(", ")));
    }
    ui.label(format!("Children: {}", node.children.len()));
    ui.label(egui::RichText::new(&node.id).small().weak());
}

struct StudioApp {
    state: StudioState,
    camera: Camera,
    tree_path: PathBuf,
}

impl StudioApp {
    fn new(state: StudioState, tree_path: PathBuf) -> Self {
        Self {
            state,
            camera: Camera::default(),
            tree_path,
        }
    }

    fn render_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let rect = response.rect;
        if self.camera.set_viewport_size(rect.width(), rect.height()) {
            debug!(
                width = rect.width(),
                height = rect.height(),
                "viewport resized"
            );
        }

        let pressed_at = ui.input(|input| {
            if input.pointer.primary_pressed() {
                input.pointer.interact_pos()
            } else {
                None
            }
        });
        if let Some(position) = pressed_at.filter(|position| rect.contains(*position)) {
            let viewport = viewport_from_rect(rect);
            let picked = self.state.engine.pointer_down(
                Vec2::new(position.x, position.y),
                &viewport,
                &self.camera,
            );
            if let Some(node_id) = picked {
                debug!(node_id = %node_id, "node picked");
            }
            self.state.apply_notifications();
        }

        paint_constellation(&painter, rect, &self.camera, self.state.engine.scene());
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions = Vec::new();

        egui::TopBottomPanel::bottom("constellation_status").show(ctx, |ui| {
            let report = self.state.engine.last_report();
            ui.label(format!(
                "{} | nodes: {} | edges: {} | layout pass: {}",
                self.tree_path.display(),
                report.bodies,
                report.edges,
                report.generation
            ));
        });

        egui::SidePanel::right("constellation_detail")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.state.render_detail_pane(ui, &mut actions));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.render_canvas(ui));

        for action in actions {
            self.state.apply(action);
        }
    }
}
