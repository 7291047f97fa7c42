//! Midpoint subdivision.
//!
//! Each pass splits every edge at its midpoint and replaces each triangle
//! `(v0, v1, v2)` by four:
//!
//! ```text
//! (v0, m01, m20), (m01, v1, m12), (m12, v2, m20), (m01, m12, m20)
//! ```
//!
//! Midpoint vertices are appended after the original vertices in the order
//! their edge is first met while walking the faces (`v0v1`, `v1v2`, `v2v0`
//! per face). The resulting vertex order therefore depends only on the
//! input vertex/face order, which keeps subdivided meshes of the same base
//! topology index-aligned across frames.

use std::collections::HashMap;

use log::debug;

use crate::geometry_indices::VertexIndex;
use crate::mesh::{Face, Mesh};

/// Applies `iterations` passes of midpoint subdivision in place.
pub fn subdivide_midpoint(mesh: &mut Mesh, iterations: usize) {
    for _ in 0..iterations {
        subdivide_once(mesh);
    }
}

/// Returns a subdivided copy, leaving `mesh` untouched.
pub fn subdivided(mesh: &Mesh, iterations: usize) -> Mesh {
    let mut out = mesh.clone();
    subdivide_midpoint(&mut out, iterations);
    out
}

struct EdgeSplitter {
    midpoints: HashMap<(u32, u32), VertexIndex>,
}

impl EdgeSplitter {
    fn new(capacity: usize) -> Self {
        Self {
            midpoints: HashMap::with_capacity(capacity),
        }
    }

    fn split(&mut self, mesh: &mut Mesh, a: VertexIndex, b: VertexIndex) -> VertexIndex {
        let key = (a.0.min(b.0), a.0.max(b.0));
        if let Some(&m) = self.midpoints.get(&key) {
            return m;
        }
        let (ia, ib) = (a.index(), b.index());
        let position = mesh.position(ia).midpoint(mesh.position(ib));
        let m = VertexIndex::from(mesh.push_position(position));
        if let Some(normals) = mesh.normals_mut() {
            let n = normals[ia].midpoint(normals[ib]).normalized();
            normals.push(n);
        }
        if let Some(colors) = mesh.colors_mut() {
            let c = colors[ia].midpoint(colors[ib]);
            colors.push(c);
        }
        self.midpoints.insert(key, m);
        m
    }
}

fn mid_uv(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
}

fn subdivide_once(mesh: &mut Mesh) {
    let faces: Vec<Face> = mesh.faces().to_vec();
    let uvs: Option<Vec<[f64; 2]>> = mesh.triangle_uvs().map(|u| u.to_vec());
    let num_vertices_before = mesh.num_vertices();

    let mut splitter = EdgeSplitter::new(faces.len() * 3 / 2);
    let mut new_faces = Vec::with_capacity(faces.len() * 4);
    let mut new_uvs = uvs.as_ref().map(|_| Vec::with_capacity(faces.len() * 12));

    for (face_id, face) in faces.iter().enumerate() {
        let [v0, v1, v2] = *face;
        let m01 = splitter.split(mesh, v0, v1);
        let m12 = splitter.split(mesh, v1, v2);
        let m20 = splitter.split(mesh, v2, v0);

        new_faces.push([v0, m01, m20]);
        new_faces.push([m01, v1, m12]);
        new_faces.push([m12, v2, m20]);
        new_faces.push([m01, m12, m20]);

        if let (Some(src), Some(dst)) = (uvs.as_ref(), new_uvs.as_mut()) {
            let t0 = src[face_id * 3];
            let t1 = src[face_id * 3 + 1];
            let t2 = src[face_id * 3 + 2];
            let t01 = mid_uv(t0, t1);
            let t12 = mid_uv(t1, t2);
            let t20 = mid_uv(t2, t0);
            dst.extend_from_slice(&[t0, t01, t20, t01, t1, t12, t12, t2, t20, t01, t12, t20]);
        }
    }

    debug!(
        "midpoint subdivision: {} -> {} vertices, {} -> {} faces",
        num_vertices_before,
        mesh.num_vertices(),
        faces.len(),
        new_faces.len()
    );
    mesh.replace_faces(new_faces, new_uvs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector3d;

    fn triangle() -> Mesh {
        Mesh::from_triangles(
            vec![
                Vector3d::new(0.0, 0.0, 0.0),
                Vector3d::new(2.0, 0.0, 0.0),
                Vector3d::new(0.0, 2.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_single_triangle_layout() {
        let mesh = subdivided(&triangle(), 1);
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 4);
        // m01, m12, m20 in creation order.
        assert_eq!(mesh.position(3), Vector3d::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.position(4), Vector3d::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.position(5), Vector3d::new(0.0, 1.0, 0.0));
        let faces: Vec<[u32; 3]> = mesh.faces().iter().map(|f| [f[0].0, f[1].0, f[2].0]).collect();
        assert_eq!(faces, vec![[0, 3, 5], [3, 1, 4], [4, 2, 5], [3, 4, 5]]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_shared_edge_split_once() {
        let mut mesh = Mesh::from_triangles(
            vec![
                Vector3d::new(0.0, 0.0, 0.0),
                Vector3d::new(1.0, 0.0, 0.0),
                Vector3d::new(1.0, 1.0, 0.0),
                Vector3d::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let edges = mesh.num_edges();
        subdivide_midpoint(&mut mesh, 1);
        assert_eq!(mesh.num_vertices(), 4 + edges);
        assert_eq!(mesh.num_faces(), 8);
    }

    #[test]
    fn test_uvs_follow_corners() {
        let mut mesh = triangle();
        mesh.set_triangle_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        subdivide_midpoint(&mut mesh, 1);
        let uvs = mesh.triangle_uvs().unwrap();
        assert_eq!(uvs.len(), 12);
        assert_eq!(uvs[1], [0.5, 0.0]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_normals_interpolated() {
        let mut mesh = triangle();
        mesh.compute_vertex_normals();
        subdivide_midpoint(&mut mesh, 1);
        let normals = mesh.normals().unwrap();
        assert_eq!(normals.len(), 6);
        assert!((normals[4].z - 1.0).abs() < 1e-12);
    }
}
