//! ASCII PLY writer for point clouds.
//!
//! Coordinates are stored as `float` (32-bit), the precision the codec works
//! in for displacement point clouds.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;
use tvmc_core::{Mesh, Vector3d};

use crate::traits::{PointCloudWriter, Writer};

/// PLY writer. Faces of added meshes are dropped: only vertices are written.
#[derive(Debug, Clone, Default)]
pub struct PlyWriter {
    points: Vec<Vector3d>,
    normals: Vec<Vector3d>,
    write_normals: bool,
}

impl PlyWriter {
    /// Also write `nx ny nz`. Only honoured when every point has a normal.
    pub fn with_normals(mut self, enabled: bool) -> Self {
        self.write_normals = enabled;
        self
    }

    fn normals_complete(&self) -> bool {
        self.write_normals && self.normals.len() == self.points.len()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let normals = self.normals_complete();
        writeln!(out, "ply")?;
        writeln!(out, "format ascii 1.0")?;
        writeln!(out, "element vertex {}", self.points.len())?;
        for axis in ["x", "y", "z"] {
            writeln!(out, "property float {axis}")?;
        }
        if normals {
            for axis in ["nx", "ny", "nz"] {
                writeln!(out, "property float {axis}")?;
            }
        }
        writeln!(out, "end_header")?;
        for (i, p) in self.points.iter().enumerate() {
            write!(out, "{} {} {}", p.x as f32, p.y as f32, p.z as f32)?;
            if normals {
                let n = self.normals[i];
                write!(out, " {} {} {}", n.x as f32, n.y as f32, n.z as f32)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl Writer for PlyWriter {
    fn new() -> Self {
        Self::default()
    }

    fn add_mesh(&mut self, mesh: &Mesh, _name: Option<&str>) -> io::Result<()> {
        self.points.extend_from_slice(mesh.positions());
        if let Some(normals) = mesh.normals() {
            self.normals.extend_from_slice(normals);
        }
        Ok(())
    }

    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(fs::File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        debug!("wrote {}: {} points", path.display(), self.points.len());
        Ok(())
    }

    fn vertex_count(&self) -> usize {
        self.points.len()
    }
}

impl PointCloudWriter for PlyWriter {
    fn add_points(&mut self, points: &[Vector3d]) {
        self.points.extend_from_slice(points);
    }
}

/// Write `points` as an ASCII float32 PLY point cloud.
pub fn write_ply_points<P: AsRef<Path>>(path: P, points: &[Vector3d]) -> io::Result<()> {
    let mut writer = PlyWriter::new();
    writer.add_points(points);
    writer.write(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply_reader::{parse_ply, read_ply_points};
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_write_ply() {
        let expected = vec![
            Vector3d::new(0.0, 0.0, 0.0),
            Vector3d::new(1.0, 0.0, 0.0),
            Vector3d::new(0.0, 1.0, 0.0),
            Vector3d::new(0.0, 0.0, 1.0),
            Vector3d::new(-1.0, -1.0, -1.0),
        ];

        let file = NamedTempFile::new().unwrap();
        write_ply_points(file.path(), &expected).unwrap();

        let positions = read_ply_points(file.path()).unwrap();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_values_rounded_to_float() {
        let mut writer = PlyWriter::new();
        writer.add_point(Vector3d::new(0.1, 1.0 / 3.0, -2.5));
        let mut bytes = Vec::new();
        writer.write_to(&mut bytes).unwrap();
        let pc = parse_ply(Cursor::new(bytes)).unwrap();
        let p = pc.position(0);
        assert_eq!(p.x, 0.1f32 as f64);
        assert_eq!(p.y, (1.0f64 / 3.0) as f32 as f64);
        assert_eq!(p.z, -2.5);
    }

    #[test]
    fn test_normals_written_when_complete() {
        let mut mesh = Mesh::from_triangles(
            vec![
                Vector3d::new(0.0, 0.0, 0.0),
                Vector3d::new(1.0, 0.0, 0.0),
                Vector3d::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        mesh.compute_vertex_normals();
        let mut writer = PlyWriter::new().with_normals(true);
        writer.add_mesh(&mesh, None).unwrap();
        let mut bytes = Vec::new();
        writer.write_to(&mut bytes).unwrap();
        let pc = parse_ply(Cursor::new(bytes)).unwrap();
        assert_eq!(pc.normals().unwrap()[0], Vector3d::new(0.0, 0.0, 1.0));
    }
}
