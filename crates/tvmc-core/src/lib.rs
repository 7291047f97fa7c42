//! TVMC Core Library
//!
//! Geometry and metrics for evaluating temporal volumetric mesh compression:
//! meshes and point clouds, midpoint subdivision, exact nearest-neighbour
//! search, correspondence resampling, displacement fields, reconstruction
//! from codec output and rate-distortion metrics.

#![allow(clippy::needless_range_loop)] // Pairwise center loops index both axes

pub mod bounds;
pub mod centers;
pub mod displacement;
pub mod distortion;
pub mod geometry_indices;
pub mod math_utils;
pub mod mesh;
pub mod point_cloud;
pub mod reconstruction;
pub mod resample;
pub mod spatial_index;
pub mod status;
pub mod subdivision;
pub mod transforms;
pub mod vector;

pub use bounds::BoundingBox;
pub use centers::{max_distance_matrix, DistanceMatrix};
pub use displacement::DisplacementField;
pub use distortion::{DistortionEvaluator, DistortionSample, DistortionSummary};
pub use geometry_indices::VertexIndex;
pub use mesh::{Face, Mesh};
pub use point_cloud::PointCloud;
pub use reconstruction::Reconstructor;
pub use resample::{resample_onto, resample_onto_index};
pub use spatial_index::{Neighbor, SpatialIndex};
pub use status::{Status, TvmcError};
pub use subdivision::{subdivide_midpoint, subdivided};
pub use transforms::{center_transforms, CenterTransforms, DualQuaternion};
pub use vector::Vector3d;
