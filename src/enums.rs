use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Axial,
    Coronal,
    Sagittal,
}

/// Which of the 26 neighbouring offsets count as adjacent for the boundary test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjacency {
    /// 6-connectivity: offsets sharing a face.
    #[default]
    Face,
    /// 18-connectivity: faces and edges.
    FaceEdge,
    /// 26-connectivity: faces, edges and corners.
    Full,
}

impl Adjacency {
    pub fn includes(self, dx: i32, dy: i32, dz: i32) -> bool {
        let non_zero = [dx, dy, dz].iter().filter(|d| **d != 0).count();
        match self {
            Adjacency::Face => non_zero == 1,
            Adjacency::FaceEdge => (1..=2).contains(&non_zero),
            Adjacency::Full => non_zero >= 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    Orthographic,
    Perspective,
}

impl Projection {
    pub fn toggled(self) -> Self {
        match self {
            Projection::Orthographic => Projection::Perspective,
            Projection::Perspective => Projection::Orthographic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    InstanceNumber,
    SlicePosition,
}
