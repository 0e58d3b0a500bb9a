//! # volume-cloud
//!
//! This crate turns a stack of 2D cross-sectional intensity images (CT
//! slices) into a classified 3D point cloud that can be rendered
//! interactively.
//!
//! Decoding image files and reading their metadata is left to the caller:
//! the crate starts from already decoded layers, either written one by one
//! into a [`VolumeGrid`] or assembled from [`SliceLayer`] records by the
//! [`VolumeLoader`], which checks that they form a regular stack.
//!
//! From there a [`PointCloudBuilder`] walks the volume and emits one
//! [`DrawablePoint`] per voxel that survives:
//!  - windowing, which maps intensity to a visibility fraction
//!  - classification, either a binary window mask or six fixed tissue bands
//!    (bone, low calcification, gray matter, white matter, fluid, fat/air)
//!  - the optional contour test, which keeps only voxels adjacent to a
//!    differently classified neighbour
//!  - the slice range selected around the active slice
//!
//! A [`ViewerSession`] ties it together: it owns the grid, the display
//! settings, the current points and a [`Camera`], and rebuilds the points on
//! every setting change.
//!
//! # Examples
//!
//! ```
//! # use volume_cloud::{VolumeGrid, ViewerSession, ViewerOptions};
//! let mut grid = VolumeGrid::new(2, 2, 2, -100.0, 100.0, 0.0)
//!     .expect("should have allocated volume");
//! grid.set_layer(0, &[32768; 4]).expect("layer 0 exists");
//! grid.set_layer(1, &[32768; 4]).expect("layer 1 exists");
//!
//! let mut session = ViewerSession::new(grid, &ViewerOptions::default());
//! assert_eq!(session.points().len(), 8);
//!
//! session.set_hide_above(true);
//! assert_eq!(session.points().len(), 4);
//! ```

pub mod camera;
pub mod classifier;
pub mod connectivity;
pub mod enums;
mod interpolator;
pub mod options;
pub mod point_cloud;
pub mod renderer;
pub mod session;
pub mod volume;
pub mod volume_loader;

pub use camera::Camera;
pub use classifier::{Segment, Window, WindowError};
pub use enums::{Adjacency, Orientation, PointerButton, Projection, SortBy};
pub use options::ViewerOptions;
pub use point_cloud::{DisplayParameters, DrawablePoint, PointCloud, PointCloudBuilder};
pub use renderer::Renderer;
pub use session::{SessionError, ViewerSession};
pub use volume::{VolumeError, VolumeGrid};
pub use volume_loader::{SliceLayer, VolumeLoader, VolumeLoaderError};
