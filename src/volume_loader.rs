use crate::{
    classifier::Window,
    enums::SortBy,
    volume::{VolumeError, VolumeGrid},
};

use std::collections::BTreeMap;
use thiserror::Error;

/// Largest accepted ratio between the instance-number span and the number
/// of layers actually supplied.
const MAX_SPAN_PER_LAYER: usize = 2;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No layers provided")]
    NoLayers,

    #[error("Inconsistent layer dimensions")]
    InconsistentDimensions,

    #[error("Multiple pixel sizes found: {first:?} and {other:?}")]
    InconsistentSpacing {
        first: (f64, f64),
        other: (f64, f64),
    },

    #[error("Multiple rescale intercepts found: {first} and {other}")]
    InconsistentIntercept { first: f64, other: f64 },

    #[error("Slices are not regularly spaced, error: {error} mm")]
    IrregularSpacing { error: f64 },

    #[error("Instance number {0} appears more than once")]
    DuplicateInstance(i32),

    #[error("Instance numbers span {span} slices for only {layers} layers")]
    InstanceSpanTooLarge { span: i64, layers: usize },

    #[error("Volume error: {0}")]
    Volume(#[from] VolumeError),
}

/// One decoded cross-section handed over by the file loader.
#[derive(Debug, Clone)]
pub struct SliceLayer {
    pub instance_number: i32,
    /// Position of the slice along the stacking axis, in mm.
    pub position_z: f64,
    /// (row spacing, column spacing) in mm
    pub pixel_spacing: (f64, f64),
    pub rescale_intercept: f64,
    pub width: usize,
    pub height: usize,
    /// Biased unsigned samples, row-major.
    pub samples: Vec<u16>,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Assemble layers into a grid
    ///
    /// # Arguments
    ///
    /// * `layers` - Decoded layers, in any order
    /// * `default_window` - Window used to seed display parameters
    /// * `sort_by` - How a layer's position in the stack is decided
    /// * `tolerance` - Largest accepted distance (mm) between a layer and its
    ///   expected position
    ///
    /// # Errors
    ///
    /// Returns error if the layers don't form a regular stack
    pub fn assemble(
        layers: &[SliceLayer],
        default_window: Window,
        sort_by: SortBy,
        tolerance: f64,
    ) -> Result<VolumeGrid, VolumeLoaderError> {
        let first = layers.first().ok_or(VolumeLoaderError::NoLayers)?;
        Self::validate_layers(layers)?;

        let indexed = Self::index_layers(layers, sort_by)?;

        let (min_index, max_index) = match (indexed.keys().next(), indexed.keys().next_back()) {
            (Some(min), Some(max)) => (i64::from(*min), i64::from(*max)),
            _ => return Err(VolumeLoaderError::NoLayers),
        };
        let span = max_index - min_index + 1;
        let depth = usize::try_from(span)
            .ok()
            .filter(|depth| *depth <= indexed.len().saturating_mul(MAX_SPAN_PER_LAYER))
            .ok_or(VolumeLoaderError::InstanceSpanTooLarge {
                span,
                layers: indexed.len(),
            })?;
        let slice_spacing = Self::slice_spacing(&indexed, tolerance)?;

        if depth != indexed.len() {
            log::warn!(
                "Expecting {depth} instances, received {} instances",
                indexed.len()
            );
        }

        let mut grid = VolumeGrid::new(
            first.width,
            first.height,
            depth,
            default_window.min(),
            default_window.max(),
            first.rescale_intercept,
        )?;
        for (index, layer) in &indexed {
            grid.set_layer((i64::from(*index) - min_index) as usize, &layer.samples)?;
        }

        let (row_spacing, column_spacing) = first.pixel_spacing;
        grid.set_spacing(column_spacing, row_spacing, slice_spacing);

        log::info!(
            "Assembled {}x{}x{depth} volume ({column_spacing}x{row_spacing}x{slice_spacing} mm)",
            first.width,
            first.height
        );
        Ok(grid)
    }

    fn validate_layers(layers: &[SliceLayer]) -> Result<(), VolumeLoaderError> {
        let first = &layers[0];
        for layer in layers {
            if layer.width != first.width
                || layer.height != first.height
                || layer.samples.len() != layer.width * layer.height
            {
                return Err(VolumeLoaderError::InconsistentDimensions);
            }
            if layer.pixel_spacing != first.pixel_spacing {
                return Err(VolumeLoaderError::InconsistentSpacing {
                    first: first.pixel_spacing,
                    other: layer.pixel_spacing,
                });
            }
            if layer.rescale_intercept != first.rescale_intercept {
                return Err(VolumeLoaderError::InconsistentIntercept {
                    first: first.rescale_intercept,
                    other: layer.rescale_intercept,
                });
            }
        }
        Ok(())
    }

    /// Stack index of every layer.
    fn index_layers(
        layers: &[SliceLayer],
        sort_by: SortBy,
    ) -> Result<BTreeMap<i32, &SliceLayer>, VolumeLoaderError> {
        let mut indexed = BTreeMap::new();
        match sort_by {
            SortBy::InstanceNumber => {
                for layer in layers {
                    if indexed.insert(layer.instance_number, layer).is_some() {
                        return Err(VolumeLoaderError::DuplicateInstance(layer.instance_number));
                    }
                }
            }
            SortBy::SlicePosition => {
                let mut sorted: Vec<_> = layers.iter().collect();
                sorted.sort_by(|a, b| a.position_z.total_cmp(&b.position_z));
                indexed.extend((0..).zip(sorted));
            }
        }
        Ok(indexed)
    }

    /// Distance between consecutive stack indices, checked against every layer.
    fn slice_spacing(
        indexed: &BTreeMap<i32, &SliceLayer>,
        tolerance: f64,
    ) -> Result<f64, VolumeLoaderError> {
        let (Some((&first_index, first)), Some((&last_index, last))) =
            (indexed.first_key_value(), indexed.last_key_value())
        else {
            return Err(VolumeLoaderError::NoLayers);
        };
        if first_index == last_index {
            return Ok(0.0);
        }

        let steps = i64::from(last_index) - i64::from(first_index);
        let spacing = (last.position_z - first.position_z) / steps as f64;
        let offset = first.position_z - f64::from(first_index) * spacing;

        for (index, layer) in indexed {
            let expected = spacing * f64::from(*index) + offset;
            let error = (expected - layer.position_z).abs();
            if error > tolerance {
                return Err(VolumeLoaderError::IrregularSpacing { error });
            }
        }

        Ok(spacing.abs())
    }
}
