//! Rebuilds frame meshes from a decoded reference and decoded displacements.
//!
//! The codec may reorder points, so neither the decoded reference nor the
//! decoded displacement field is assumed to keep the original vertex order.
//! Each decoded-reference vertex is realigned in three hops:
//!
//! 1. nearest vertex of the original subdivided reference,
//! 2. the original (pre-codec) displacement stored at that index,
//! 3. nearest decoded displacement to that original value.
//!
//! Hop 1 depends only on the two reference meshes and is resolved once in
//! [`Reconstructor::new`]; hops 2 and 3 run per frame.
//!
//! Under lossy quantisation hop 3 is only approximately right: two nearby
//! displacement values may swap. The result is still deterministic.

use log::debug;
use rayon::prelude::*;

use crate::displacement::DisplacementField;
use crate::mesh::Mesh;
use crate::spatial_index::SpatialIndex;
use crate::status::{Status, TvmcError};
use crate::vector::Vector3d;

/// Per-group reconstruction state shared by every frame.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    decoded_reference: Mesh,
    original_len: usize,
    reference_matches: Vec<usize>,
}

impl Reconstructor {
    /// `original_reference` and `decoded_reference` are both the once
    /// subdivided reference topology, before and after the codec.
    pub fn new(original_reference: &Mesh, decoded_reference: Mesh) -> Status<Self> {
        let index = SpatialIndex::build(original_reference.positions());
        let reference_matches = index
            .nearest_all(decoded_reference.positions())?
            .into_iter()
            .map(|n| n.index)
            .collect();
        Ok(Self {
            decoded_reference,
            original_len: original_reference.num_vertices(),
            reference_matches,
        })
    }

    pub fn decoded_reference(&self) -> &Mesh {
        &self.decoded_reference
    }

    /// Displacement per decoded-reference vertex, picked from `decoded`.
    pub fn realign(
        &self,
        original: &DisplacementField,
        decoded: &[Vector3d],
    ) -> Status<DisplacementField> {
        if original.len() != self.original_len {
            return Err(TvmcError::LengthMismatch {
                what: "original displacement field",
                expected: self.original_len,
                actual: original.len(),
            });
        }
        let decoded_index = SpatialIndex::build(decoded);
        if decoded_index.is_empty() {
            return Err(TvmcError::EmptyPointSet("decoded displacement field"));
        }
        let targets: Vec<Vector3d> = self
            .reference_matches
            .iter()
            .map(|&i| original.get(i))
            .collect();
        let picked = decoded_index.nearest_all(&targets)?;
        let vectors = picked
            .par_iter()
            .map(|n| decoded_index.point(n.index))
            .collect();
        Ok(DisplacementField::from_vectors(vectors))
    }

    /// Decoded reference plus realigned displacement, on the decoded
    /// reference topology, with fresh vertex normals.
    pub fn reconstruct(&self, original: &DisplacementField, decoded: &[Vector3d]) -> Status<Mesh> {
        let field = self.realign(original, decoded)?;
        let positions = field.apply_to(self.decoded_reference.positions())?;
        let mut mesh = Mesh::from_parts(positions, self.decoded_reference.faces().to_vec())?;
        mesh.compute_vertex_normals();
        debug!(
            "reconstructed {} vertices from {} decoded displacements",
            mesh.num_vertices(),
            decoded.len()
        );
        Ok(mesh)
    }
}

/// One-shot reconstruction of a single frame.
pub fn reconstruct_frame(
    original_reference: &Mesh,
    decoded_reference: &Mesh,
    original: &DisplacementField,
    decoded: &[Vector3d],
) -> Status<Mesh> {
    Reconstructor::new(original_reference, decoded_reference.clone())?.reconstruct(original, decoded)
}
