use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

use crate::geometry_indices::VertexIndex;
use crate::point_cloud::PointCloud;
use crate::status::{ok_status, Status, TvmcError};
use crate::vector::Vector3d;

pub type Face = [VertexIndex; 3];

/// Triangle mesh: a point cloud plus ordered index triples.
///
/// Texture coordinates are stored per corner (three per face) because the
/// text mesh format indexes them independently of positions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    point_cloud: PointCloud,
    faces: Vec<Face>,
    triangle_uvs: Option<Vec<[f64; 2]>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh and validates its topology.
    pub fn from_parts(positions: Vec<Vector3d>, faces: Vec<Face>) -> Status<Self> {
        let mesh = Self {
            point_cloud: PointCloud::from_positions(positions),
            faces,
            triangle_uvs: None,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Convenience constructor from raw index triples.
    pub fn from_triangles(positions: Vec<Vector3d>, triangles: &[[u32; 3]]) -> Status<Self> {
        let faces = triangles
            .iter()
            .map(|t| [VertexIndex(t[0]), VertexIndex(t[1]), VertexIndex(t[2])])
            .collect();
        Self::from_parts(positions, faces)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.point_cloud.num_points()
    }

    pub fn point_cloud(&self) -> &PointCloud {
        &self.point_cloud
    }

    pub fn into_point_cloud(self) -> PointCloud {
        self.point_cloud
    }

    pub(crate) fn replace_faces(&mut self, faces: Vec<Face>, triangle_uvs: Option<Vec<[f64; 2]>>) {
        self.faces = faces;
        self.triangle_uvs = triangle_uvs;
    }

    pub fn triangle_uvs(&self) -> Option<&[[f64; 2]]> {
        self.triangle_uvs.as_deref()
    }

    pub fn set_triangle_uvs(&mut self, uvs: Vec<[f64; 2]>) -> Status {
        if uvs.len() != self.faces.len() * 3 {
            return Err(TvmcError::AttributeMismatch(format!(
                "{} texture coordinates for {} triangles (expected {})",
                uvs.len(),
                self.faces.len(),
                self.faces.len() * 3
            )));
        }
        self.triangle_uvs = Some(uvs);
        Ok(())
    }

    /// Checks that every index is in range and no triangle repeats a vertex.
    pub fn validate(&self) -> Status {
        let num_vertices = self.num_vertices();
        for (face_id, face) in self.faces.iter().enumerate() {
            for v in face {
                if v.index() >= num_vertices {
                    return Err(TvmcError::IndexOutOfRange {
                        face: face_id,
                        index: v.0,
                        num_vertices,
                    });
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
                return Err(TvmcError::DegenerateTriangle(face_id));
            }
        }
        if let Some(uvs) = &self.triangle_uvs {
            if uvs.len() != self.faces.len() * 3 {
                return Err(TvmcError::AttributeMismatch(format!(
                    "{} texture coordinates for {} triangles",
                    uvs.len(),
                    self.faces.len()
                )));
            }
        }
        ok_status()
    }

    /// Number of distinct undirected edges.
    pub fn num_edges(&self) -> usize {
        let mut edges = HashSet::with_capacity(self.faces.len() * 3 / 2);
        for face in &self.faces {
            for k in 0..3 {
                let a = face[k].0;
                let b = face[(k + 1) % 3].0;
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges.len()
    }

    /// Recomputes per-vertex normals as the normalised, area-weighted sum of
    /// incident triangle normals. Vertices on no triangle get a zero normal.
    pub fn compute_vertex_normals(&mut self) {
        let normals = self.vertex_normals();
        self.point_cloud.replace_normals(normals);
    }

    /// The normals [`Self::compute_vertex_normals`] would install, without
    /// touching the mesh.
    pub fn vertex_normals(&self) -> Vec<Vector3d> {
        let positions = self.point_cloud.positions();
        let mut normals = vec![Vector3d::ZERO; positions.len()];
        for face in &self.faces {
            let p0 = positions[face[0].index()];
            let p1 = positions[face[1].index()];
            let p2 = positions[face[2].index()];
            let n = (p1 - p0).cross(p2 - p0);
            for v in face {
                normals[v.index()] += n;
            }
        }
        for n in &mut normals {
            *n = n.normalized();
        }
        normals
    }

    /// Copy of this mesh with every vertex moved by `offset`.
    pub fn translated(&self, offset: Vector3d) -> Self {
        let mut mesh = self.clone();
        for p in mesh.point_cloud.positions_mut() {
            *p += offset;
        }
        mesh
    }
}

impl Deref for Mesh {
    type Target = PointCloud;

    fn deref(&self) -> &Self::Target {
        &self.point_cloud
    }
}

impl DerefMut for Mesh {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.point_cloud
    }
}
