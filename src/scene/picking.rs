use glam::{Mat4, Vec2, Vec3};

use super::SceneGraph;

/// Screen-space rectangle of the rendering surface, in the same units as pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, pointer: Vec2) -> bool {
        pointer.x >= self.left
            && pointer.x <= self.left + self.width
            && pointer.y >= self.top
            && pointer.y <= self.top + self.height
    }

    /// Maps normalized device coordinates back to a screen point.
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            self.left + (ndc.x + 1.0) * 0.5 * self.width,
            self.top + (1.0 - ndc.y) * 0.5 * self.height,
        )
    }
}

/// Converts a raw pointer position into normalized device coordinates (`-1..=1`, y up).
/// Pointers outside the viewport produce `None`.
pub fn pointer_to_ndc(pointer: Vec2, viewport: &ViewportRect) -> Option<Vec2> {
    if viewport.is_empty() || !viewport.contains(pointer) {
        return None;
    }
    Some(Vec2::new(
        (pointer.x - viewport.left) / viewport.width * 2.0 - 1.0,
        1.0 - (pointer.y - viewport.top) / viewport.height * 2.0,
    ))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Distance along the ray to the first surface hit, if any.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let offset = self.origin - center;
        let b = offset.dot(self.direction);
        let c = offset.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }
}

/// Perspective camera. Orbit controls live outside the core; only the
/// projection and aspect tracking needed for drawing and picking are here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 70.0, 130.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 55_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2_000.0,
        }
    }
}

impl Camera {
    /// Tracks the surface size. Returns `true` when the aspect ratio changed.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) -> bool {
        if width <= 0.0 || height <= 0.0 {
            return false;
        }
        let aspect = width / height;
        if (aspect - self.aspect).abs() <= f32::EPSILON {
            return false;
        }
        self.aspect = aspect;
        true
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let on_far_plane = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray {
            origin: self.eye,
            direction: (on_far_plane - self.eye).normalize(),
        }
    }

    /// Projects a world point to normalized device coordinates; `None` behind the camera.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }

    /// On-screen radius of a sphere of `radius` at `center`, for a viewport `viewport_height` tall.
    pub fn projected_radius(&self, center: Vec3, radius: f32, viewport_height: f32) -> Option<f32> {
        let distance = (self.view() * center.extend(1.0)).z.abs();
        if distance <= self.near {
            return None;
        }
        Some(radius / (distance * (self.fov_y * 0.5).tan()) * viewport_height * 0.5)
    }
}

/// Nearest body hit by the ray through `ndc`, as a node id.
pub fn pick(ndc: Vec2, camera: &Camera, scene: &SceneGraph) -> Option<String> {
    let ray = camera.ray_through(ndc);
    scene
        .bodies()
        .filter_map(|(_, body)| {
            ray.intersect_sphere(body.center, body.effective_radius())
                .map(|distance| (distance, body))
        })
        .min_by(|(left, _), (right, _)| left.total_cmp(right))
        .map(|(_, body)| body.node_id.clone())
}
