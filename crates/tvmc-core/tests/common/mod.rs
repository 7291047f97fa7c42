#![allow(dead_code)]

use tvmc_core::{Mesh, Vector3d};

/// Unit cube, 8 vertices and 12 outward-facing triangles.
pub fn cube() -> Mesh {
    let positions = vec![
        Vector3d::new(0.0, 0.0, 0.0),
        Vector3d::new(1.0, 0.0, 0.0),
        Vector3d::new(1.0, 1.0, 0.0),
        Vector3d::new(0.0, 1.0, 0.0),
        Vector3d::new(0.0, 0.0, 1.0),
        Vector3d::new(1.0, 0.0, 1.0),
        Vector3d::new(1.0, 1.0, 1.0),
        Vector3d::new(0.0, 1.0, 1.0),
    ];
    let triangles = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    Mesh::from_triangles(positions, &triangles).unwrap()
}

/// Regular `n × n` grid of points on the z = 0 plane, triangulated.
pub fn grid(n: u32, spacing: f64) -> Mesh {
    let mut positions = Vec::new();
    for y in 0..n {
        for x in 0..n {
            positions.push(Vector3d::new(x as f64 * spacing, y as f64 * spacing, 0.0));
        }
    }
    let mut triangles = Vec::new();
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let i = y * n + x;
            triangles.push([i, i + 1, i + n + 1]);
            triangles.push([i, i + n + 1, i + n]);
        }
    }
    Mesh::from_triangles(positions, &triangles).unwrap()
}
