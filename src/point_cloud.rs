//! Extraction of drawable points from a classified volume.
//!
//! Every parameter change rebuilds the whole sequence; nothing is updated in
//! place. Layers are processed as independent slabs on the rayon pool and
//! concatenated in order, so the output is always in ascending flat-index
//! order.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::Range;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rayon::prelude::*;

use crate::classifier::Window;
use crate::connectivity::is_boundary;
use crate::enums::Adjacency;
use crate::volume::VolumeGrid;

/// Immutable snapshot of every display setting that affects the point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayParameters {
    pub window: Window,
    /// Zero-based layer index.
    pub active_slice: usize,
    /// Hide layers below the active slice.
    pub hide_below: bool,
    /// Hide layers above the active slice.
    pub hide_above: bool,
    pub contours_mode: bool,
    /// Material bands instead of the binary window mask.
    pub color_mode: bool,
    pub highlight_active_slice: bool,
    /// Skip voxels whose visibility is exactly zero.
    pub hide_empty_points: bool,
    pub alpha: f32,
}

impl DisplayParameters {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            active_slice: 0,
            hide_below: false,
            hide_above: false,
            contours_mode: false,
            color_mode: false,
            highlight_active_slice: false,
            hide_empty_points: true,
            alpha: 0.05,
        }
    }

    /// Binary masks use face adjacency, material bands the full neighbourhood.
    pub fn adjacency(&self) -> Adjacency {
        if self.color_mode {
            Adjacency::Full
        } else {
            Adjacency::Face
        }
    }
}

/// Render primitive emitted for one voxel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawablePoint {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub alpha: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<DrawablePoint>,
}

impl PointCloud {
    pub fn new(points: Vec<DrawablePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[DrawablePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawablePoint> {
        self.points.iter()
    }

    /// Vertex buffer contents, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }

    /// Writes one `x y z` row per point. Color and alpha are not exported.
    pub fn write_xyz<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for point in &self.points {
            let [x, y, z] = point.position;
            writeln!(writer, "{x} {y} {z}")?;
        }
        writer.flush()
    }

    pub fn save_xyz(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_xyz(BufWriter::new(file))?;
        log::info!(
            "Exported {} points to {}",
            self.points.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a DrawablePoint;
    type IntoIter = std::slice::Iter<'a, DrawablePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Maps voxel coordinates to render space: centred on the volume, largest
/// physical extent of length 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderScale {
    factors: Vec3,
    half_dims: Vec3,
}

impl RenderScale {
    pub fn from_grid(grid: &VolumeGrid) -> Self {
        let (width, height, depth) = grid.dimensions();
        let dims = Vec3::new(width as f32, height as f32, depth as f32);
        let (sx, sy, sz) = grid.spacing();
        let mut spacing = Vec3::new(sx as f32, sy as f32, sz as f32);

        let mut max_extent = (dims * spacing).max_element();
        if !max_extent.is_finite() || max_extent <= 0.0 {
            log::warn!("Volume has no physical extent, falling back to unit spacing");
            spacing = Vec3::ONE;
            max_extent = dims.max_element();
        }

        Self {
            factors: spacing * (2.0 / max_extent),
            half_dims: dims / 2.0,
        }
    }

    #[inline]
    pub fn position(&self, col: usize, row: usize, layer: usize) -> [f32; 3] {
        let voxel = Vec3::new(col as f32, row as f32, layer as f32);
        ((voxel - self.half_dims) * self.factors).to_array()
    }
}

pub struct PointCloudBuilder<'a> {
    grid: &'a VolumeGrid,
    scale: RenderScale,
}

impl<'a> PointCloudBuilder<'a> {
    pub fn new(grid: &'a VolumeGrid) -> Self {
        Self {
            grid,
            scale: RenderScale::from_grid(grid),
        }
    }

    /// Flat-index range selected by the slice visibility flags, clipped to
    /// the volume.
    pub fn iteration_range(&self, params: &DisplayParameters) -> Range<usize> {
        let layer_len = self.grid.layer_len();
        let total = self.grid.voxel_count();
        let slice_start = params.active_slice.saturating_mul(layer_len);
        let slice_end = params.active_slice.saturating_add(1).saturating_mul(layer_len);

        let (start, end) = match (params.hide_below, params.hide_above) {
            (false, false) => (0, total),
            (true, false) => (slice_start, total),
            (false, true) => (0, slice_end),
            (true, true) => (slice_start, slice_end),
        };
        let end = end.min(total);
        start.min(end)..end
    }

    pub fn build(&self, params: &DisplayParameters) -> PointCloud {
        let range = self.iteration_range(params);
        if range.is_empty() {
            return PointCloud::default();
        }

        let layer_len = self.grid.layer_len();
        let first_layer = range.start / layer_len;
        let last_layer = range.end.div_ceil(layer_len);

        let slabs: Vec<Vec<DrawablePoint>> = (first_layer..last_layer)
            .into_par_iter()
            .map(|layer| {
                let start = range.start.max(layer * layer_len);
                let end = range.end.min((layer + 1) * layer_len);
                self.build_slab(start..end, params)
            })
            .collect();

        let mut points = Vec::with_capacity(slabs.iter().map(Vec::len).sum());
        slabs.into_iter().for_each(|slab| points.extend(slab));

        log::debug!("Nb points: {}", points.len());
        PointCloud::new(points)
    }

    /// Visibility is always measured against the grid's own window; the
    /// active window in `params` only drives classification.
    fn build_slab(&self, range: Range<usize>, params: &DisplayParameters) -> Vec<DrawablePoint> {
        let mut points = Vec::with_capacity(range.len());
        let adjacency = params.adjacency();
        let visible = self.grid.default_window();

        for index in range {
            let (col, row, layer) = self.grid.coordinate_of(index);
            let raw = f64::from(self.grid.value_at(col, row, layer));
            let visibility = visible.normalize(raw);
            if visibility == 0.0 && params.hide_empty_points {
                continue;
            }

            let segment = params.window.classify(raw, params.color_mode);
            if segment.is_background() {
                continue;
            }
            if params.contours_mode
                && !is_boundary(
                    self.grid,
                    adjacency,
                    (col, row, layer),
                    segment,
                    &params.window,
                    params.color_mode,
                )
            {
                continue;
            }

            let alpha = if params.highlight_active_slice && layer == params.active_slice {
                1.0
            } else {
                params.alpha
            };

            points.push(DrawablePoint {
                position: self.scale.position(col, row, layer),
                color: segment.color(visibility),
                alpha,
            });
        }

        points
    }
}
