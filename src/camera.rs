//! Interactive camera around the render-space volume.
//!
//! The volume occupies at most `[-1, 1]³`. Rotations happen about its
//! centre and are composed in screen space: each new drag rotation is
//! premultiplied onto the current one. Panning moves the rotated volume in
//! the screen plane.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4Swizzles};

use crate::enums::{PointerButton, Projection};
use crate::options::{CameraControls, PerspectiveSettings, ViewerOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Orientation of the volume in view space.
    pub rotation: Quat,
    /// Screen-plane translation in render units.
    pub pan: Vec2,
    /// Zoom on a log2 scale: positive is closer.
    pub log2_zoom: f32,
    pub projection: Projection,
    pub controls: CameraControls,
    pub perspective: PerspectiveSettings,
    last_pointer: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_options(&ViewerOptions::default())
    }
}

impl Camera {
    pub fn from_options(options: &ViewerOptions) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            pan: Vec2::ZERO,
            log2_zoom: 0.0,
            projection: options.projection,
            controls: options.controls,
            perspective: options.perspective,
            last_pointer: None,
        }
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    pub fn toggle_projection(&mut self) {
        self.projection = self.projection.toggled();
    }

    /// Restores rotation, pan and zoom. The projection is kept.
    pub fn reset(&mut self) {
        self.rotation = Quat::IDENTITY;
        self.pan = Vec2::ZERO;
        self.log2_zoom = 0.0;
        self.last_pointer = None;
    }

    #[inline]
    fn modified(&self, delta: f32, modifier: bool) -> f32 {
        if modifier {
            delta * self.controls.modifier_multiplier
        } else {
            delta
        }
    }

    /// Rotates by a pointer delta in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32, modifier: bool) {
        let scale = self.controls.rotate_degrees_per_pixel;
        let yaw = (self.modified(dx, modifier) * scale).to_radians();
        let pitch = (self.modified(dy, modifier) * scale).to_radians();
        let local = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
        self.rotation = (local * self.rotation).normalize();
    }

    /// Translates by a pointer delta in pixels. Screen y grows downwards.
    pub fn translate(&mut self, dx: f32, dy: f32, modifier: bool) {
        let scale = self.controls.pan_per_pixel;
        self.pan += Vec2::new(self.modified(dx, modifier), -self.modified(dy, modifier)) * scale;
    }

    /// Applies a wheel delta in wheel units.
    pub fn wheel(&mut self, delta: f32, modifier: bool) {
        self.log2_zoom += self.modified(delta * self.controls.zoom_per_wheel_unit, modifier);
    }

    pub fn pointer_press(&mut self, x: f32, y: f32) {
        self.last_pointer = Some(Vec2::new(x, y));
    }

    pub fn pointer_release(&mut self) {
        self.last_pointer = None;
    }

    /// Handles a pointer move while `button` is held. Moves without a prior
    /// press only record the position.
    pub fn pointer_move(&mut self, x: f32, y: f32, button: PointerButton, modifier: bool) {
        let position = Vec2::new(x, y);
        if let Some(last) = self.last_pointer {
            let delta = position - last;
            match button {
                PointerButton::Primary => self.rotate(delta.x, delta.y, modifier),
                PointerButton::Secondary => self.translate(delta.x, delta.y, modifier),
                PointerButton::Other => {}
            }
        }
        self.last_pointer = Some(position);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.pan.extend(0.0)) * Mat4::from_quat(self.rotation)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self.projection {
            Projection::Orthographic => {
                let half = 2f32.powf(-self.log2_zoom);
                Mat4::from_scale(Vec3::new(1.0, aspect_ratio, 1.0))
                    * Mat4::orthographic_rh_gl(-half, half, -half, half, -half, half)
            }
            Projection::Perspective => {
                let PerspectiveSettings {
                    fov_degrees,
                    near,
                    far,
                } = self.perspective;
                let offset =
                    Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0 * (1.0 - self.log2_zoom)));
                Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect_ratio, near, far) * offset
            }
        }
    }

    pub fn view_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    /// Normalised device coordinates of `point`, or `None` when it is clipped.
    pub fn project(&self, point: Vec3, aspect_ratio: f32) -> Option<Vec3> {
        let clip = self.view_projection_matrix(aspect_ratio) * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        (ndc.abs().max_element() <= 1.0).then_some(ndc)
    }
}
