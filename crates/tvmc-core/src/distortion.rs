//! Geometric distortion between two meshes.
//!
//! Every metric is built on the same exact 1-nearest-neighbour matching,
//! computed once per direction when a [`DistortionEvaluator`] is created:
//!
//! * D1 (point-to-point): mean squared distance to the matched point, as PSNR
//!   with the source's bounding-box diagonal as peak. Reported as the larger
//!   of the two directional values.
//! * D2 (point-to-plane): squared projection of the offset onto the matched
//!   point's vertex normal, same PSNR and peak. Larger of both directions.
//! * log-MSE / log-RMSE: base-10 logs of the D1 error. Smaller of both
//!   directions.
//! * Hausdorff: directed distance from A to B, scaled by [`HAUSDORFF_SCALE`].
//!
//! Per-point errors are computed in parallel and reduced in point order, so
//! identical inputs always produce identical bits.

use rayon::prelude::*;

use crate::math_utils::{max_value, mean, psnr};
use crate::mesh::Mesh;
use crate::spatial_index::{Neighbor, SpatialIndex};
use crate::status::{Status, TvmcError};
use crate::vector::Vector3d;

/// Factor applied to the directed Hausdorff distance when reported.
pub const HAUSDORFF_SCALE: f64 = 1e4;

/// Which mesh plays the source role in a directional measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Points of A matched against B.
    AToB,
    /// Points of B matched against A.
    BToA,
}

/// Distortion of one reconstructed frame against its ground truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionSample {
    pub d1_psnr: f64,
    pub d2_psnr: f64,
    pub log_mse: f64,
    pub log_rmse: f64,
    pub hausdorff: f64,
}

/// Mean of every metric over a group of frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionSummary {
    pub frames: usize,
    pub d1_psnr: f64,
    pub d2_psnr: f64,
    pub log_mse: f64,
    pub log_rmse: f64,
    pub hausdorff: f64,
}

impl DistortionSummary {
    /// Averages `samples`; `None` when there are none.
    pub fn from_samples(samples: &[DistortionSample]) -> Option<Self> {
        let column = |f: fn(&DistortionSample) -> f64| -> Option<f64> {
            let values: Vec<f64> = samples.iter().map(f).collect();
            mean(&values)
        };
        Some(Self {
            frames: samples.len(),
            d1_psnr: column(|s| s.d1_psnr)?,
            d2_psnr: column(|s| s.d2_psnr)?,
            log_mse: column(|s| s.log_mse)?,
            log_rmse: column(|s| s.log_rmse)?,
            hausdorff: column(|s| s.hausdorff)?,
        })
    }
}

struct Matching {
    neighbors: Vec<Neighbor>,
    peak: f64,
}

impl Matching {
    fn new(source: &Mesh, target: &SpatialIndex) -> Status<Self> {
        let neighbors = target.nearest_all(source.positions())?;
        let peak = source.bounding_box().map(|b| b.diagonal()).unwrap_or(0.0);
        Ok(Self { neighbors, peak })
    }

    fn mse(&self) -> f64 {
        let errors: Vec<f64> = self.neighbors.iter().map(|n| n.distance_squared).collect();
        mean(&errors).unwrap_or(0.0)
    }
}

/// Pairwise evaluator for meshes A and B.
///
/// Both spatial indices, both matchings and both normal sets are built once
/// in [`Self::new`]; every metric after that is a pure read.
pub struct DistortionEvaluator<'a> {
    a: &'a Mesh,
    b: &'a Mesh,
    normals_a: Option<Vec<Vector3d>>,
    normals_b: Option<Vec<Vector3d>>,
    a_to_b: Matching,
    b_to_a: Matching,
}

impl<'a> DistortionEvaluator<'a> {
    pub fn new(a: &'a Mesh, b: &'a Mesh) -> Status<Self> {
        if a.is_empty() {
            return Err(TvmcError::EmptyPointSet("distortion source mesh"));
        }
        if b.is_empty() {
            return Err(TvmcError::EmptyPointSet("distortion target mesh"));
        }
        let index_a = SpatialIndex::build(a.positions());
        let index_b = SpatialIndex::build(b.positions());
        Ok(Self {
            a,
            b,
            normals_a: plane_normals(a),
            normals_b: plane_normals(b),
            a_to_b: Matching::new(a, &index_b)?,
            b_to_a: Matching::new(b, &index_a)?,
        })
    }

    fn parts(&self, direction: Direction) -> (&Mesh, &Mesh, Option<&[Vector3d]>, &Matching) {
        match direction {
            Direction::AToB => (self.a, self.b, self.normals_b.as_deref(), &self.a_to_b),
            Direction::BToA => (self.b, self.a, self.normals_a.as_deref(), &self.b_to_a),
        }
    }

    /// Mean squared point-to-point error.
    pub fn point_to_point_mse(&self, direction: Direction) -> f64 {
        self.parts(direction).3.mse()
    }

    /// Mean squared point-to-plane error against the target's normals.
    ///
    /// A target with neither faces nor stored normals has no plane to
    /// project on and is rejected.
    pub fn point_to_plane_mse(&self, direction: Direction) -> Status<f64> {
        let (source, target, normals, matching) = self.parts(direction);
        let normals = normals.ok_or(TvmcError::MissingNormals("point-to-plane target"))?;
        let targets = target.positions();
        let errors: Vec<f64> = source
            .positions()
            .par_iter()
            .zip(matching.neighbors.par_iter())
            .map(|(p, n)| {
                let projected = (*p - targets[n.index]).dot(normals[n.index]);
                projected * projected
            })
            .collect();
        Ok(mean(&errors).unwrap_or(0.0))
    }

    pub fn d1_psnr_directed(&self, direction: Direction) -> f64 {
        let matching = self.parts(direction).3;
        psnr(matching.peak, matching.mse())
    }

    pub fn d2_psnr_directed(&self, direction: Direction) -> Status<f64> {
        let matching = self.parts(direction).3;
        Ok(psnr(matching.peak, self.point_to_plane_mse(direction)?))
    }

    /// Symmetric D1 PSNR: the larger directional value.
    pub fn d1_psnr(&self) -> f64 {
        self.d1_psnr_directed(Direction::AToB)
            .max(self.d1_psnr_directed(Direction::BToA))
    }

    /// Symmetric D2 PSNR: the larger directional value.
    pub fn d2_psnr(&self) -> Status<f64> {
        Ok(self
            .d2_psnr_directed(Direction::AToB)?
            .max(self.d2_psnr_directed(Direction::BToA)?))
    }

    /// `(log10(MSE), log10(RMSE))`, each the smaller directional value.
    /// A perfect match yields negative infinity.
    pub fn log_mse_rmse(&self) -> (f64, f64) {
        let forward = self.point_to_point_mse(Direction::AToB);
        let backward = self.point_to_point_mse(Direction::BToA);
        let log_mse = forward.log10().min(backward.log10());
        let log_rmse = forward.sqrt().log10().min(backward.sqrt().log10());
        (log_mse, log_rmse)
    }

    /// Directed Hausdorff distance from A to B, scaled.
    pub fn hausdorff(&self) -> f64 {
        let distances: Vec<f64> = self.a_to_b.neighbors.iter().map(Neighbor::distance).collect();
        max_value(&distances).unwrap_or(0.0) * HAUSDORFF_SCALE
    }

    pub fn sample(&self) -> Status<DistortionSample> {
        let (log_mse, log_rmse) = self.log_mse_rmse();
        Ok(DistortionSample {
            d1_psnr: self.d1_psnr(),
            d2_psnr: self.d2_psnr()?,
            log_mse,
            log_rmse,
            hausdorff: self.hausdorff(),
        })
    }
}

/// Normals used as the plane reference: recomputed from the triangles, or the
/// stored normals for a mesh without faces. `None` when neither exists.
fn plane_normals(mesh: &Mesh) -> Option<Vec<Vector3d>> {
    if mesh.num_faces() == 0 {
        return mesh.normals().map(<[Vector3d]>::to_vec);
    }
    Some(mesh.vertex_normals())
}

pub fn d1_psnr(a: &Mesh, b: &Mesh) -> Status<f64> {
    Ok(DistortionEvaluator::new(a, b)?.d1_psnr())
}

pub fn d2_psnr(a: &Mesh, b: &Mesh) -> Status<f64> {
    DistortionEvaluator::new(a, b)?.d2_psnr()
}

pub fn log_mse_rmse(a: &Mesh, b: &Mesh) -> Status<(f64, f64)> {
    Ok(DistortionEvaluator::new(a, b)?.log_mse_rmse())
}

pub fn hausdorff(a: &Mesh, b: &Mesh) -> Status<f64> {
    Ok(DistortionEvaluator::new(a, b)?.hausdorff())
}

/// Every metric for a reconstructed frame against ground truth.
pub fn evaluate(ground_truth: &Mesh, reconstructed: &Mesh) -> Status<DistortionSample> {
    DistortionEvaluator::new(ground_truth, reconstructed)?.sample()
}
