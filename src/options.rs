//! Configuration options for a viewer session.

use serde::{Deserialize, Serialize};

use crate::enums::Projection;

/// Pointer and wheel sensitivities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraControls {
    /// Rotation in degrees per pixel of drag.
    pub rotate_degrees_per_pixel: f32,
    /// Translation in render units per pixel of drag.
    pub pan_per_pixel: f32,
    /// log2 zoom change per wheel unit.
    pub zoom_per_wheel_unit: f32,
    /// Applied to every delta while the modifier key is held.
    pub modifier_multiplier: f32,
}

impl Default for CameraControls {
    fn default() -> Self {
        Self {
            rotate_degrees_per_pixel: 0.5,
            pan_per_pixel: 0.001,
            zoom_per_wheel_unit: 0.001,
            modifier_multiplier: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near: 0.5,
            far: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerOptions {
    /// Opacity of every point outside a highlighted slice.
    pub alpha: f32,

    /// Skip voxels whose windowed visibility is zero.
    pub hide_empty_points: bool,

    pub projection: Projection,

    pub controls: CameraControls,

    pub perspective: PerspectiveSettings,

    /// Snapshot background color.
    pub background_color: [f32; 3],

    /// Rebuilds slower than this are logged as warnings.
    pub rebuild_budget_ms: f64,

    /// Largest accepted deviation of a layer from its expected position, in mm.
    pub slice_spacing_tolerance: f64,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            hide_empty_points: true,
            projection: Projection::Orthographic,
            controls: CameraControls::default(),
            perspective: PerspectiveSettings::default(),
            background_color: [0.0, 0.0, 0.0],
            rebuild_budget_ms: 50.0,
            slice_spacing_tolerance: 0.01,
        }
    }
}
