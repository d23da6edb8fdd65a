use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Stroke};
use glam::{Vec2, Vec3};

use crate::scene::SceneGraph;
use crate::scene::picking::{Camera, ViewportRect};

const BACKGROUND: Color32 = Color32::from_rgb(9, 11, 22);
const LABEL_COLOR: Color32 = Color32::from_gray(222);
const SELECTED_RING: Color32 = Color32::from_rgb(255, 244, 200);
const LABEL_FONT_SIZE: f32 = 12.0;
const MIN_BODY_PIXELS: f32 = 2.0;

pub fn viewport_from_rect(rect: Rect) -> ViewportRect {
    ViewportRect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// Draws the current primitive set. Read-only: the scene is never mutated here.
pub fn paint_constellation(painter: &Painter, rect: Rect, camera: &Camera, scene: &SceneGraph) {
    painter.rect_filled(rect, 0.0, BACKGROUND);
    let viewport = viewport_from_rect(rect);

    for (_, edge) in scene.edges() {
        let (Some(from), Some(to)) = (
            project_to_screen(camera, &viewport, edge.from),
            project_to_screen(camera, &viewport, edge.to),
        ) else {
            continue;
        };
        painter.line_segment(
            [from.0, to.0],
            Stroke::new(1.0, edge.color.gamma_multiply(0.7)),
        );
    }

    let mut visible_bodies = scene
        .bodies()
        .filter_map(|(_, body)| {
            let (screen, depth) = project_to_screen(camera, &viewport, body.center)?;
            let radius = camera
                .projected_radius(body.center, body.effective_radius(), viewport.height)?
                .max(MIN_BODY_PIXELS);
            Some((depth, screen, radius, body))
        })
        .collect::<Vec<_>>();
    // Far bodies first so nearer ones paint over them.
    visible_bodies.sort_by(|left, right| right.0.total_cmp(&left.0));

    for (_, screen, radius, body) in visible_bodies {
        painter.circle_filled(screen, radius, glow(body.color, body.emissive));
        if body.is_emphasized() {
            painter.circle_stroke(screen, radius + 2.0, Stroke::new(1.5, SELECTED_RING));
        }
    }

    for (_, label) in scene.labels() {
        let Some((screen, _)) = project_to_screen(camera, &viewport, label.anchor) else {
            continue;
        };
        painter.text(
            screen,
            Align2::CENTER_BOTTOM,
            &label.text,
            FontId::proportional(LABEL_FONT_SIZE),
            LABEL_COLOR,
        );
    }
}

/// Screen position plus NDC depth, or `None` for points behind the camera.
fn project_to_screen(camera: &Camera, viewport: &ViewportRect, world: Vec3) -> Option<(Pos2, f32)> {
    let ndc = camera.project(world)?;
    let screen = viewport.ndc_to_screen(Vec2::new(ndc.x, ndc.y));
    Some((egui::pos2(screen.x, screen.y), ndc.z))
}

/// Brightens `color` toward white in proportion to the emissive intensity.
pub fn glow(color: Color32, emissive: f32) -> Color32 {
    let amount = (emissive.clamp(0.0, 1.0) * 0.5 * 255.0) as u16;
    let lift = |channel: u8| -> u8 {
        let channel = u16::from(channel);
        (channel + (255 - channel) * amount / 255) as u8
    };
    Color32::from_rgb(lift(color.r()), lift(color.g()), lift(color.b()))
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Color32, Rect, pos2};

    use crate::scene::{BASE_EMISSIVE, SELECTED_EMISSIVE};

    use super::{glow, viewport_from_rect};

    #[test]
    fn glow_brightens_with_emissive_and_keeps_white() {
        let base = Color32::from_rgb(40, 80, 160);
        let calm = glow(base, BASE_EMISSIVE);
        let bright = glow(base, SELECTED_EMISSIVE);

        assert!(bright.r() > calm.r());
        assert!(bright.g() > calm.g());
        assert!(bright.b() > calm.b());
        assert_eq!(glow(Color32::WHITE, SELECTED_EMISSIVE), Color32::WHITE);
        assert_eq!(glow(base, 0.0), base);
    }

    #[test]
    fn viewport_matches_rect_geometry() {
        let viewport = viewport_from_rect(Rect::from_min_max(pos2(10.0, 20.0), pos2(110.0, 70.0)));
        assert_eq!(viewport.left, 10.0);
        assert_eq!(viewport.top, 20.0);
        assert_eq!(viewport.width, 100.0);
        assert_eq!(viewport.height, 50.0);
    }
}
