//! Correspondence resampling between meshes of unrelated topology.
//!
//! A fixed-topology source is subdivided once and each resulting vertex is
//! snapped onto its nearest target vertex. Connectivity is never touched,
//! so every frame resampled from the same base topology shares one vertex
//! indexing and can be differenced against the reference.
//!
//! Several source vertices may land on the same target vertex.

use log::debug;

use crate::displacement::DisplacementField;
use crate::mesh::Mesh;
use crate::spatial_index::SpatialIndex;
use crate::status::Status;
use crate::subdivision::subdivided;

/// Subdivision passes applied to the decimated base before snapping.
pub const SUBDIVISION_LEVEL: usize = 1;

/// Moves every vertex of `mesh` onto its nearest point in `target`.
pub fn snap_vertices(mesh: &mut Mesh, target: &SpatialIndex) -> Status {
    let matches = target.nearest_all(mesh.positions())?;
    let snapped = matches.iter().map(|n| target.point(n.index)).collect();
    mesh.set_positions(snapped)?;
    // Positions moved, so any carried normals are stale.
    mesh.clear_normals();
    Ok(())
}

/// Subdivides `source` and snaps the result onto the vertices of `target`.
pub fn resample_onto(source: &Mesh, target: &Mesh) -> Status<Mesh> {
    let index = SpatialIndex::build(target.positions());
    resample_onto_index(source, &index)
}

/// Same as [`resample_onto`] with a target index built by the caller.
pub fn resample_onto_index(source: &Mesh, target: &SpatialIndex) -> Status<Mesh> {
    let mut mesh = subdivided(source, SUBDIVISION_LEVEL);
    snap_vertices(&mut mesh, target)?;
    debug!(
        "resampled {} source vertices onto {} target vertices",
        mesh.num_vertices(),
        target.len()
    );
    Ok(mesh)
}

/// Displacement of a resampled frame relative to the subdivided reference.
pub fn displacement_field(resampled: &Mesh, reference: &Mesh) -> Status<DisplacementField> {
    DisplacementField::between(resampled.positions(), reference.positions())
}
