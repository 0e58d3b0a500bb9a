//! A single-user viewing session over one loaded volume.
//!
//! The session owns the grid, the mutable display settings, the current
//! point sequence and the camera. Every setter that changes what is shown
//! rebuilds the whole point sequence before returning.

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;
use web_time::Instant;

use crate::camera::Camera;
use crate::classifier::{Window, WindowError};
use crate::enums::{PointerButton, Projection};
use crate::options::ViewerOptions;
use crate::point_cloud::{DisplayParameters, PointCloud, PointCloudBuilder};
use crate::renderer::Renderer;
use crate::volume::{VolumeError, VolumeGrid};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Volume error: {0}")]
    Volume(#[from] VolumeError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Alpha must lie in [0, 1], got {0}")]
    InvalidAlpha(f32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub struct ViewerSession {
    grid: VolumeGrid,
    params: DisplayParameters,
    window_center: f64,
    window_width: f64,
    points: PointCloud,
    camera: Camera,
    renderer: Renderer,
    rebuild_budget_ms: f64,
}

impl ViewerSession {
    pub fn new(grid: VolumeGrid, options: &ViewerOptions) -> Self {
        let window = grid.default_window();
        let params = DisplayParameters {
            alpha: options.alpha,
            hide_empty_points: options.hide_empty_points,
            ..DisplayParameters::new(window)
        };
        let mut session = Self {
            grid,
            params,
            window_center: window.center(),
            window_width: window.width(),
            points: PointCloud::default(),
            camera: Camera::from_options(options),
            renderer: Renderer::new(options.background_color),
            rebuild_budget_ms: options.rebuild_budget_ms,
        };
        session.rebuild();
        session
    }

    pub fn grid(&self) -> &VolumeGrid {
        &self.grid
    }

    pub fn points(&self) -> &PointCloud {
        &self.points
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn display_parameters(&self) -> &DisplayParameters {
        &self.params
    }

    pub fn window_center(&self) -> f64 {
        self.window_center
    }

    pub fn window_width(&self) -> f64 {
        self.window_width
    }

    /// Swaps in a freshly loaded volume. The window returns to the new
    /// volume's default, the active slice to the first layer and the camera
    /// to its initial pose.
    pub fn replace_volume(&mut self, grid: VolumeGrid) {
        let window = grid.default_window();
        self.grid = grid;
        self.camera.reset();
        self.window_center = window.center();
        self.window_width = window.width();
        self.params = DisplayParameters {
            window,
            active_slice: 0,
            ..self.params
        };
        self.rebuild();
    }

    /// Replaces every display flag at once.
    pub fn set_display_parameters(
        &mut self,
        params: DisplayParameters,
    ) -> Result<(), SessionError> {
        self.check_slice(params.active_slice)?;
        self.check_alpha(params.alpha)?;
        self.window_center = params.window.center();
        self.window_width = params.window.width();
        self.params = params;
        self.rebuild();
        Ok(())
    }

    /// Rejected values leave the current window in place.
    pub fn set_window_center(&mut self, center: f64) -> Result<(), SessionError> {
        self.apply_window(center, self.window_width)
    }

    pub fn set_window_width(&mut self, width: f64) -> Result<(), SessionError> {
        self.apply_window(self.window_center, width)
    }

    fn apply_window(&mut self, center: f64, width: f64) -> Result<(), SessionError> {
        let window = Window::from_center_width(center, width)?;
        self.window_center = center;
        self.window_width = width;
        self.update(|params| params.window = window);
        Ok(())
    }

    pub fn set_active_slice(&mut self, slice: usize) -> Result<(), SessionError> {
        self.check_slice(slice)?;
        self.update(|params| params.active_slice = slice);
        Ok(())
    }

    pub fn set_alpha(&mut self, alpha: f32) -> Result<(), SessionError> {
        self.check_alpha(alpha)?;
        self.update(|params| params.alpha = alpha);
        Ok(())
    }

    pub fn set_contours_mode(&mut self, enabled: bool) {
        self.update(|params| params.contours_mode = enabled);
    }

    pub fn set_color_mode(&mut self, enabled: bool) {
        self.update(|params| params.color_mode = enabled);
    }

    pub fn set_hide_above(&mut self, enabled: bool) {
        self.update(|params| params.hide_above = enabled);
    }

    pub fn set_hide_below(&mut self, enabled: bool) {
        self.update(|params| params.hide_below = enabled);
    }

    pub fn set_highlight_active_slice(&mut self, enabled: bool) {
        self.update(|params| params.highlight_active_slice = enabled);
    }

    pub fn set_hide_empty_points(&mut self, enabled: bool) {
        self.update(|params| params.hide_empty_points = enabled);
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.camera.set_projection(projection);
    }

    pub fn toggle_projection(&mut self) {
        self.camera.toggle_projection();
    }

    pub fn pointer_press(&mut self, x: f32, y: f32) {
        self.camera.pointer_press(x, y);
    }

    pub fn pointer_release(&mut self) {
        self.camera.pointer_release();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32, button: PointerButton, modifier: bool) {
        self.camera.pointer_move(x, y, button, modifier);
    }

    pub fn wheel(&mut self, delta: f32, modifier: bool) {
        self.camera.wheel(delta, modifier);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    /// Draws the current points with the current camera.
    pub fn render(&self, width: u32, height: u32) -> RgbaImage {
        self.renderer.render(&self.points, &self.camera, width, height)
    }

    pub fn save_snapshot(
        &self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> Result<(), SessionError> {
        self.render(width, height).save(path.as_ref())?;
        log::info!("Snapshot saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn export_xyz(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        self.points.save_xyz(path)?;
        Ok(())
    }

    fn check_slice(&self, slice: usize) -> Result<(), VolumeError> {
        let depth = self.grid.depth();
        if slice >= depth {
            return Err(VolumeError::LayerOutOfRange {
                layer: slice,
                depth,
            });
        }
        Ok(())
    }

    fn check_alpha(&self, alpha: f32) -> Result<(), SessionError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(SessionError::InvalidAlpha(alpha));
        }
        Ok(())
    }

    fn update(&mut self, change: impl FnOnce(&mut DisplayParameters)) {
        let mut params = self.params;
        change(&mut params);
        self.params = params;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let start = Instant::now();
        self.points = PointCloudBuilder::new(&self.grid).build(&self.params);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        log::debug!(
            "Rebuilt {} points in {elapsed_ms:.1} ms",
            self.points.len()
        );
        if elapsed_ms > self.rebuild_budget_ms {
            log::warn!(
                "Point rebuild took {elapsed_ms:.1} ms, over the {:.1} ms budget",
                self.rebuild_budget_ms
            );
        }
    }
}
