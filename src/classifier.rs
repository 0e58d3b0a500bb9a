//! Intensity windowing and tissue classification.
//!
//! All functions here are pure. A [`Window`] can only be built from a
//! non-empty interval, so the division in [`Window::normalize`] is always
//! well defined.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("Degenerate window: max ({max}) must be greater than min ({min})")]
    Degenerate { min: f64, max: f64 },

    #[error("Window bounds must be finite")]
    NonFinite,
}

/// Visible intensity interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    min: f64,
    max: f64,
}

impl Window {
    pub fn new(min: f64, max: f64) -> Result<Self, WindowError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(WindowError::NonFinite);
        }
        if max <= min {
            return Err(WindowError::Degenerate { min, max });
        }
        Ok(Self { min, max })
    }

    /// Builds `[center - width / 2, center + width / 2]`.
    pub fn from_center_width(center: f64, width: f64) -> Result<Self, WindowError> {
        Self::new(center - width / 2.0, center + width / 2.0)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Maps a raw intensity to a visibility fraction in `[0, 1]`.
    #[inline]
    pub fn normalize(&self, value: f64) -> f32 {
        if value < self.min {
            return 0.0;
        }
        if value > self.max {
            return 1.0;
        }
        ((value - self.min) / (self.max - self.min)) as f32
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    #[inline]
    pub fn classify(&self, value: f64, color_mode: bool) -> Segment {
        if color_mode {
            Segment::from_material_bands(value)
        } else if self.contains(value) {
            Segment::Binary
        } else {
            Segment::Background
        }
    }
}

/// Material/tissue tag attached to a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Segment {
    Background = 0,
    Binary = 1,
    Bone = 2,
    LowCalcification = 3,
    GrayMatter = 4,
    WhiteMatter = 5,
    Fluid = 6,
    FatLungAir = 7,
}

pub struct TissueBand {
    /// Inclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound.
    pub high: f64,
    pub segment: Segment,
}

/// Fixed anatomical bands, evaluated in order. First match wins.
pub const MATERIAL_BANDS: &[TissueBand] = &[
    TissueBand {
        low: 200.0,
        high: 1024.0,
        segment: Segment::Bone,
    },
    TissueBand {
        low: 100.0,
        high: 200.0,
        segment: Segment::LowCalcification,
    },
    TissueBand {
        low: 37.0,
        high: 45.0,
        segment: Segment::GrayMatter,
    },
    TissueBand {
        low: 20.0,
        high: 30.0,
        segment: Segment::WhiteMatter,
    },
    TissueBand {
        low: -5.0,
        high: 15.0,
        segment: Segment::Fluid,
    },
    TissueBand {
        low: -1024.0,
        high: -10.0,
        segment: Segment::FatLungAir,
    },
];

impl Segment {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Segment::Background),
            1 => Some(Segment::Binary),
            2 => Some(Segment::Bone),
            3 => Some(Segment::LowCalcification),
            4 => Some(Segment::GrayMatter),
            5 => Some(Segment::WhiteMatter),
            6 => Some(Segment::Fluid),
            7 => Some(Segment::FatLungAir),
            _ => None,
        }
    }

    /// Values in the gaps between bands stay unclassified.
    pub fn from_material_bands(value: f64) -> Self {
        MATERIAL_BANDS
            .iter()
            .find(|band| value >= band.low && value < band.high)
            .map_or(Segment::Background, |band| band.segment)
    }

    pub fn is_background(self) -> bool {
        self == Segment::Background
    }

    /// Display color. Only [`Segment::Binary`] depends on `visibility`.
    pub fn color(self, visibility: f32) -> [f32; 3] {
        match self {
            Segment::Background => [0.0, 0.0, 0.0],
            Segment::Binary => [visibility, visibility, visibility],
            Segment::Bone => [1.0, 1.0, 1.0],
            Segment::LowCalcification => [0.5, 0.5, 0.5],
            Segment::GrayMatter => [0.0, 1.0, 0.0],
            Segment::WhiteMatter => [1.0, 0.7, 0.0],
            Segment::Fluid => [0.2, 0.2, 1.0],
            Segment::FatLungAir => [1.0, 0.0, 0.0],
        }
    }
}

pub fn normalize(value: f64, win_min: f64, win_max: f64) -> Result<f32, WindowError> {
    Ok(Window::new(win_min, win_max)?.normalize(value))
}

pub fn classify(
    value: f64,
    win_min: f64,
    win_max: f64,
    color_mode: bool,
) -> Result<Segment, WindowError> {
    Ok(Window::new(win_min, win_max)?.classify(value, color_mode))
}

pub fn color_of(segment: Segment, visibility: f32) -> [f32; 3] {
    segment.color(visibility)
}
