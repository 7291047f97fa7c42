//! Cross-format checks: every file an evaluation run produces can be read
//! back by the matching reader.

use std::fs;
use std::io;

use tempfile::tempdir;
use tvmc_core::{subdivided, DisplacementField, Mesh, Vector3d};
use tvmc_io::{
    read_displacements, read_obj, read_ply_points, write_displacements, write_obj, write_ply_points, ObjReader,
    PlyReader, PointCloudReader, Reader,
};

fn tetrahedron() -> Mesh {
    Mesh::from_triangles(
        vec![
            Vector3d::new(0.0, 0.0, 0.0),
            Vector3d::new(1.0, 0.0, 0.0),
            Vector3d::new(0.0, 1.0, 0.0),
            Vector3d::new(0.0, 0.0, 1.0),
        ],
        &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
    .unwrap()
}

#[test]
fn subdivided_mesh_survives_obj() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fitting_mesh.obj");
    let mesh = subdivided(&tetrahedron(), 1);
    write_obj(&path, &mesh).unwrap();

    let mut reader = ObjReader::open(&path).unwrap();
    let back = reader.read_mesh().unwrap();
    assert_eq!(back.positions(), mesh.positions());
    assert_eq!(back.faces(), mesh.faces());
}

#[test]
fn obj_point_reader_returns_vertices() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("frame.obj");
    write_obj(&path, &tetrahedron()).unwrap();
    let mut reader = ObjReader::open(&path).unwrap();
    assert_eq!(reader.read_points().unwrap().len(), 4);
}

#[test]
fn displacement_text_and_ply_agree_within_precision() {
    let dir = tempdir().unwrap();
    let field = DisplacementField::from_vectors(vec![
        Vector3d::new(0.001, -0.25, 0.0),
        Vector3d::new(1.5, 2.0, -3.125),
    ]);
    let txt = dir.path().join("displacements.txt");
    let ply = dir.path().join("displacements.ply");
    write_displacements(&txt, &field).unwrap();
    write_ply_points(&ply, field.vectors()).unwrap();

    let from_txt = read_displacements(&txt).unwrap();
    let from_ply = read_ply_points(&ply).unwrap();
    assert_eq!(from_txt.len(), 2);
    for (a, b) in from_txt.vectors().iter().zip(&from_ply) {
        assert!((a.x - b.x).abs() < 1e-6);
        assert!((a.y - b.y).abs() < 1e-6);
        assert!((a.z - b.z).abs() < 1e-6);
    }
}

#[test]
fn ply_reader_as_mesh_has_no_faces() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("points.ply");
    write_ply_points(&path, tetrahedron().positions()).unwrap();
    let mut reader = PlyReader::open(&path).unwrap();
    let mesh = reader.read_mesh().unwrap();
    assert_eq!(mesh.num_vertices(), 4);
    assert_eq!(mesh.num_faces(), 0);
}

#[test]
fn missing_files_are_not_found() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.obj");
    assert_eq!(read_obj(&missing).unwrap_err().kind(), io::ErrorKind::NotFound);
    assert_eq!(
        read_ply_points(dir.path().join("nope.ply")).unwrap_err().kind(),
        io::ErrorKind::NotFound
    );
}

#[test]
fn malformed_obj_is_invalid_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.obj");
    fs::write(&path, "v 0 0 0\nv 1 0 0\nf 1 2 7\n").unwrap();
    assert_eq!(read_obj(&path).unwrap_err().kind(), io::ErrorKind::InvalidData);
}
