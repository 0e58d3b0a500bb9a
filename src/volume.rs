use crate::classifier::{Window, WindowError};
use crate::enums::Orientation;
use crate::interpolator::Interpolator;

use image::{GrayImage, ImageBuffer};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, s};
use rayon::prelude::*;
use thiserror::Error;

/// Offset between the unsigned samples handed over by the loader and the
/// signed intensity they encode.
pub const SAMPLE_BIAS: i32 = 1 << 15;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("Invalid volume dimensions {width}x{height}x{depth}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        depth: usize,
    },

    #[error("Layer {layer} is outside of volume (depth={depth})")]
    LayerOutOfRange { layer: usize, depth: usize },

    #[error("Layer size mismatch: expected {expected} samples, got {actual}")]
    LayerSizeMismatch { expected: usize, actual: usize },

    #[error("Voxel ({col}, {row}, {layer}) is outside of volume")]
    IndexOutOfBounds { col: usize, row: usize, layer: usize },

    #[error("Invalid default window: {0}")]
    Window(#[from] WindowError),
}

/// Min/max signed intensity over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeStats {
    pub min: i16,
    pub max: i16,
    pub voxel_count: usize,
}

/// Stack of equally sized layers.
///
/// Voxels are stored as `u16` cells holding the two's-complement bit pattern
/// of a signed intensity, in a `(depth, height, width)` array. Standard
/// layout makes the flat index `col + row * width + layer * width * height`.
#[derive(Debug, Clone)]
pub struct VolumeGrid {
    data: Array3<u16>,
    /// (pixel_width, pixel_height, slice_spacing) in millimetres
    spacing: (f64, f64, f64),
    default_window: Window,
    rescale_intercept: f64,
}

impl VolumeGrid {
    pub fn new(
        width: usize,
        height: usize,
        depth: usize,
        window_min: f64,
        window_max: f64,
        rescale_intercept: f64,
    ) -> Result<Self, VolumeError> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(VolumeError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }
        let default_window = Window::new(window_min, window_max)?;

        Ok(Self {
            data: Array3::zeros((depth, height, width)),
            spacing: (1.0, 1.0, 1.0),
            default_window,
            rescale_intercept,
        })
    }

    /// Get the dimensions of the volume (width, height, depth)
    pub fn dimensions(&self) -> (usize, usize, usize) {
        let (depth, height, width) = self.data.dim();
        (width, height, depth)
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn depth(&self) -> usize {
        self.data.dim().0
    }

    pub fn layer_len(&self) -> usize {
        self.width() * self.height()
    }

    pub fn voxel_count(&self) -> usize {
        self.data.len()
    }

    pub fn spacing(&self) -> (f64, f64, f64) {
        self.spacing
    }

    pub fn set_spacing(&mut self, pixel_width: f64, pixel_height: f64, slice_spacing: f64) {
        self.spacing = (pixel_width, pixel_height, slice_spacing);
    }

    pub fn default_window(&self) -> Window {
        self.default_window
    }

    pub fn rescale_intercept(&self) -> f64 {
        self.rescale_intercept
    }

    /// Raw storage view, `(depth, height, width)`.
    pub fn data(&self) -> ArrayView3<'_, u16> {
        self.data.view()
    }

    /// Physical size of the volume along (x, y, z) in millimetres.
    pub fn physical_extent(&self) -> (f64, f64, f64) {
        let (width, height, depth) = self.dimensions();
        (
            width as f64 * self.spacing.0,
            height as f64 * self.spacing.1,
            depth as f64 * self.spacing.2,
        )
    }

    /// Writes one full layer, removing the loader's unsigned bias.
    ///
    /// The intercept is applied in floating point and each result is rounded
    /// to the nearest integer, so a fractional intercept shifts values by at
    /// most half a unit. Nothing is written when the layer index or sample
    /// count is wrong.
    pub fn set_layer(&mut self, layer: usize, samples: &[u16]) -> Result<(), VolumeError> {
        let depth = self.depth();
        if layer >= depth {
            return Err(VolumeError::LayerOutOfRange { layer, depth });
        }
        let expected = self.layer_len();
        if samples.len() != expected {
            return Err(VolumeError::LayerSizeMismatch {
                expected,
                actual: samples.len(),
            });
        }

        let offset = f64::from(SAMPLE_BIAS) - self.rescale_intercept;
        let width = self.width();
        let mut target = self.data.slice_mut(s![layer, .., ..]);
        target
            .indexed_iter_mut()
            .for_each(|((row, col), cell)| {
                let signed = (f64::from(samples[col + row * width]) - offset)
                    .round()
                    .clamp(f64::from(i16::MIN), f64::from(i16::MAX));
                *cell = signed as i16 as u16;
            });

        log::debug!("Layer {layer} written ({expected} samples)");
        Ok(())
    }

    /// Signed intensity of one voxel.
    ///
    /// Panics on out-of-range indices; use [`VolumeGrid::get`] for a checked read.
    #[inline]
    pub fn value_at(&self, col: usize, row: usize, layer: usize) -> i16 {
        debug_assert!(
            col < self.width() && row < self.height() && layer < self.depth(),
            "voxel ({col}, {row}, {layer}) outside of volume"
        );
        self.data[[layer, row, col]] as i16
    }

    pub fn get(&self, col: usize, row: usize, layer: usize) -> Result<i16, VolumeError> {
        self.data
            .get([layer, row, col])
            .map(|v| *v as i16)
            .ok_or(VolumeError::IndexOutOfBounds { col, row, layer })
    }

    /// Inverse of the flattening formula: `(col, row, layer)`.
    #[inline]
    pub fn coordinate_of(&self, index: usize) -> (usize, usize, usize) {
        let width = self.width();
        let height = self.height();
        (index % width, (index / width) % height, index / (width * height))
    }

    #[inline]
    pub fn flat_index(&self, col: usize, row: usize, layer: usize) -> usize {
        col + row * self.width() + layer * self.layer_len()
    }

    pub fn stats(&self) -> VolumeStats {
        let (min, max) = self
            .data
            .par_iter()
            .map(|v| (*v as i16, *v as i16))
            .reduce(
                || (i16::MAX, i16::MIN),
                |a, b| (a.0.min(b.0), a.1.max(b.1)),
            );
        VolumeStats {
            min,
            max,
            voxel_count: self.voxel_count(),
        }
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, u16>> {
        if !self.is_valid_index(index, orientation) {
            return None;
        }
        let slice = match orientation {
            Orientation::Axial => self.data.slice(s![index, .., ..]),
            Orientation::Coronal => self.data.slice(s![.., index, ..]),
            Orientation::Sagittal => self.data.slice(s![.., .., index]),
        };
        Some(slice)
    }

    /// Windowed 8-bit preview of one slice.
    ///
    /// Coronal and sagittal slices are resampled so that one output pixel
    /// covers the same physical distance on both image axes.
    pub fn slice_image(
        &self,
        index: usize,
        orientation: Orientation,
        window: &Window,
    ) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, orientation)?;
        let visibility: Array2<f32> = slice.mapv(|v| window.normalize(f64::from(v as i16)));

        if matches!(orientation, Orientation::Axial) {
            return Self::plane_to_image(&visibility.view());
        }

        let (width, height) = self.get_output_dimensions(orientation);
        let plane = visibility.view();
        let plane = &plane;
        let pixel_data: Vec<u8> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    Self::to_u8(Interpolator::resample(plane, x, y, width, height))
                })
            })
            .collect();

        ImageBuffer::from_raw(width, height, pixel_data)
    }

    #[inline]
    fn to_u8(visibility: f32) -> u8 {
        (visibility * 255.0).round().clamp(0.0, 255.0) as u8
    }

    fn plane_to_image(plane: &ArrayView2<'_, f32>) -> Option<GrayImage> {
        let (height, width) = plane.dim();
        let pixel_data: Vec<u8> = plane.iter().map(|v| Self::to_u8(*v)).collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }

    fn get_output_dimensions(&self, orientation: Orientation) -> (u32, u32) {
        let iso = Interpolator::isotropic_dimensions(self.spacing, self.data.dim());
        // Always (width, height)
        match orientation {
            Orientation::Axial => (iso.2, iso.1),
            Orientation::Coronal => (iso.2, iso.0),
            Orientation::Sagittal => (iso.1, iso.0),
        }
    }

    fn is_valid_index(&self, index: usize, orientation: Orientation) -> bool {
        let max_index = match orientation {
            Orientation::Axial => self.depth(),
            Orientation::Coronal => self.height(),
            Orientation::Sagittal => self.width(),
        };
        index < max_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(width: usize, height: usize, depth: usize) -> VolumeGrid {
        VolumeGrid::new(width, height, depth, -100.0, 100.0, 0.0).unwrap()
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        for (w, h, d) in [(0, 2, 2), (2, 0, 2), (2, 2, 0)] {
            assert!(matches!(
                VolumeGrid::new(w, h, d, -1.0, 1.0, 0.0),
                Err(VolumeError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn test_degenerate_default_window_is_rejected() {
        assert!(matches!(
            VolumeGrid::new(2, 2, 2, 5.0, 5.0, 0.0),
            Err(VolumeError::Window(_))
        ));
    }

    #[test]
    fn test_new_grid_is_zeroed() {
        let g = grid(3, 2, 4);
        assert_eq!(g.dimensions(), (3, 2, 4));
        assert_eq!(g.voxel_count(), 24);
        assert!(g.data().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_set_layer_removes_bias_and_applies_intercept() {
        let mut g = VolumeGrid::new(2, 1, 2, -100.0, 100.0, -1024.0).unwrap();
        // raw 32768 encodes 0 before the intercept
        g.set_layer(1, &[32768, 32768 + 1064]).unwrap();
        assert_eq!(g.value_at(0, 0, 1), -1024);
        assert_eq!(g.value_at(1, 0, 1), 40);
        assert_eq!(g.value_at(0, 0, 0), 0);
    }

    #[test]
    fn test_fractional_intercept_rounds_each_sample() {
        let mut g = VolumeGrid::new(3, 1, 1, -100.0, 100.0, -1024.4).unwrap();
        // 1.6, 0.6 and -0.4 after the intercept
        g.set_layer(0, &[32768 + 1026, 32768 + 1025, 32768 + 1024]).unwrap();
        assert_eq!(g.value_at(0, 0, 0), 2);
        assert_eq!(g.value_at(1, 0, 0), 1);
        assert_eq!(g.value_at(2, 0, 0), 0);
    }

    #[test]
    fn test_set_layer_saturates_instead_of_wrapping() {
        let mut g = VolumeGrid::new(1, 1, 1, -100.0, 100.0, -1024.0).unwrap();
        g.set_layer(0, &[0]).unwrap();
        assert_eq!(g.value_at(0, 0, 0), i16::MIN);
    }

    #[test]
    fn test_set_layer_out_of_range_leaves_grid_untouched() {
        let mut g = grid(2, 2, 2);
        let err = g.set_layer(2, &[40_000; 4]).unwrap_err();
        assert!(matches!(
            err,
            VolumeError::LayerOutOfRange { layer: 2, depth: 2 }
        ));
        assert!(g.data().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_set_layer_size_mismatch() {
        let mut g = grid(2, 2, 2);
        assert!(matches!(
            g.set_layer(0, &[1, 2, 3]),
            Err(VolumeError::LayerSizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_checked_get() {
        let g = grid(2, 2, 2);
        assert_eq!(g.get(1, 1, 1).unwrap(), 0);
        assert!(matches!(
            g.get(2, 0, 0),
            Err(VolumeError::IndexOutOfBounds { col: 2, .. })
        ));
    }

    #[test]
    fn test_flat_index_matches_storage_order() {
        let mut g = grid(3, 2, 2);
        let samples: Vec<u16> = (0..6).map(|i| 32768 + i).collect();
        g.set_layer(1, &samples).unwrap();
        let flat: Vec<u16> = g.data().iter().copied().collect();
        for i in 0..6usize {
            let (col, row, layer) = g.coordinate_of(6 + i);
            assert_eq!(layer, 1);
            assert_eq!(g.value_at(col, row, layer), i as i16);
            assert_eq!(flat[6 + i] as i16, i as i16);
        }
    }

    #[test]
    fn test_stats() {
        let mut g = grid(2, 1, 2);
        g.set_layer(0, &[32768 - 50, 32768 + 300]).unwrap();
        let stats = g.stats();
        assert_eq!(stats.min, -50);
        assert_eq!(stats.max, 300);
        assert_eq!(stats.voxel_count, 4);
    }

    #[test]
    fn test_physical_extent() {
        let mut g = grid(4, 2, 3);
        g.set_spacing(0.5, 0.5, 2.0);
        assert_eq!(g.physical_extent(), (2.0, 1.0, 6.0));
    }

    #[test]
    fn test_axial_slice_image_is_windowed() {
        let mut g = grid(2, 1, 1);
        g.set_layer(0, &[32768 - 100, 32768 + 100]).unwrap();
        let image = g
            .slice_image(0, Orientation::Axial, &g.default_window())
            .unwrap();
        assert_eq!(image.dimensions(), (2, 1));
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.get_pixel(1, 0).0, [255]);
    }

    #[test]
    fn test_coronal_slice_image_is_resampled() {
        let mut g = grid(4, 4, 2);
        g.set_spacing(1.0, 1.0, 2.0);
        g.set_layer(0, &[32768 + 100; 16]).unwrap();
        g.set_layer(1, &[32768 + 100; 16]).unwrap();
        let image = g
            .slice_image(1, Orientation::Coronal, &g.default_window())
            .unwrap();
        // two slices 2 mm apart become four rows
        assert_eq!(image.dimensions(), (4, 4));
        assert!(image.pixels().all(|p| p.0 == [255]));
    }

    #[test]
    fn test_slice_image_rejects_invalid_index() {
        let g = grid(2, 3, 4);
        let w = g.default_window();
        assert!(g.slice_image(4, Orientation::Axial, &w).is_none());
        assert!(g.slice_image(3, Orientation::Coronal, &w).is_none());
        assert!(g.slice_image(2, Orientation::Sagittal, &w).is_none());
    }

    proptest! {
        #[test]
        fn coordinate_round_trip(
            w in 1usize..8,
            h in 1usize..8,
            d in 1usize..8,
            seed in 0usize..10_000,
        ) {
            let g = grid(w, h, d);
            let index = seed % (w * h * d);
            let (col, row, layer) = g.coordinate_of(index);
            prop_assert!(col < w && row < h && layer < d);
            prop_assert_eq!(g.flat_index(col, row, layer), index);
        }
    }
}
