//! OBJ format writer.
//!
//! By default only positions and faces are written, which is what every
//! artifact of an evaluation run needs. Normals, colours and per-corner
//! texture coordinates can be switched on.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;
use tvmc_core::Mesh;

use crate::traits::Writer;

#[derive(Debug, Clone)]
struct Part {
    name: Option<String>,
    mesh: Mesh,
}

/// OBJ writer accumulating one or more named meshes.
#[derive(Debug, Clone, Default)]
pub struct ObjWriter {
    parts: Vec<Part>,
    write_normals: bool,
    write_colors: bool,
    write_uvs: bool,
}

impl ObjWriter {
    pub fn with_normals(mut self, enabled: bool) -> Self {
        self.write_normals = enabled;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.write_colors = enabled;
        self
    }

    pub fn with_uvs(mut self, enabled: bool) -> Self {
        self.write_uvs = enabled;
        self
    }

    /// Serialise everything added so far.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut vertex_base = 1usize;
        let mut uv_base = 1usize;
        for part in &self.parts {
            let mesh = &part.mesh;
            if let Some(name) = &part.name {
                writeln!(out, "o {name}")?;
            }
            let colors = mesh.colors().filter(|_| self.write_colors);
            for (i, p) in mesh.positions().iter().enumerate() {
                match colors {
                    Some(c) => writeln!(out, "v {} {} {} {} {} {}", p.x, p.y, p.z, c[i].x, c[i].y, c[i].z)?,
                    None => writeln!(out, "v {} {} {}", p.x, p.y, p.z)?,
                }
            }
            let normals = mesh.normals().filter(|_| self.write_normals);
            if let Some(normals) = normals {
                for n in normals {
                    writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
                }
            }
            let uvs = mesh.triangle_uvs().filter(|_| self.write_uvs);
            if let Some(uvs) = uvs {
                for uv in uvs {
                    writeln!(out, "vt {} {}", uv[0], uv[1])?;
                }
            }
            for (face_id, face) in mesh.faces().iter().enumerate() {
                write!(out, "f")?;
                for (k, v) in face.iter().enumerate() {
                    let vi = v.index() + vertex_base;
                    match (uvs.is_some(), normals.is_some()) {
                        (true, true) => write!(out, " {vi}/{}/{vi}", uv_base + face_id * 3 + k)?,
                        (true, false) => write!(out, " {vi}/{}", uv_base + face_id * 3 + k)?,
                        (false, true) => write!(out, " {vi}//{vi}")?,
                        (false, false) => write!(out, " {vi}")?,
                    }
                }
                writeln!(out)?;
            }
            vertex_base += mesh.num_vertices();
            uv_base += uvs.map_or(0, |u| u.len());
        }
        Ok(())
    }
}

impl Writer for ObjWriter {
    fn new() -> Self {
        Self::default()
    }

    fn add_mesh(&mut self, mesh: &Mesh, name: Option<&str>) -> io::Result<()> {
        self.parts.push(Part {
            name: name.map(str::to_string),
            mesh: mesh.clone(),
        });
        Ok(())
    }

    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(fs::File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        debug!(
            "wrote {}: {} vertices, {} faces",
            path.display(),
            self.vertex_count(),
            self.face_count()
        );
        Ok(())
    }

    fn vertex_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.num_vertices()).sum()
    }

    fn face_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.num_faces()).sum()
    }
}

/// Write positions and faces of `mesh` to `path`.
pub fn write_obj<P: AsRef<Path>>(path: P, mesh: &Mesh) -> io::Result<()> {
    let mut writer = ObjWriter::new();
    writer.add_mesh(mesh, None)?;
    writer.write(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj_reader::{parse_obj, read_obj};
    use std::io::Cursor;
    use tempfile::NamedTempFile;
    use tvmc_core::Vector3d;

    fn triangle() -> Mesh {
        Mesh::from_triangles(
            vec![
                Vector3d::new(0.1, 0.2, 0.3),
                Vector3d::new(1.0, 0.0, 0.0),
                Vector3d::new(0.0, 1.0, 1.0 / 3.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_positions_survive_exactly() {
        let file = NamedTempFile::new().unwrap();
        let mesh = triangle();
        write_obj(file.path(), &mesh).unwrap();
        let back = read_obj(file.path()).unwrap();
        assert_eq!(back.positions(), mesh.positions());
        assert_eq!(back.faces(), mesh.faces());
        assert!(!back.has_normals());
    }

    #[test]
    fn test_attributes_when_enabled() {
        let mut mesh = triangle();
        mesh.compute_vertex_normals();
        mesh.set_triangle_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        let writer = {
            let mut w = ObjWriter::new().with_normals(true).with_uvs(true);
            w.add_mesh(&mesh, Some("tri")).unwrap();
            w
        };
        let mut bytes = Vec::new();
        writer.write_to(&mut bytes).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("o tri"));
        assert!(text.contains("f 1/1/1 2/2/2 3/3/3"));

        let back = parse_obj(Cursor::new(text)).unwrap();
        assert_eq!(back.triangle_uvs(), mesh.triangle_uvs());
        assert!(back.has_normals());
    }

    #[test]
    fn test_multiple_parts_offset_indices() {
        let mut writer = ObjWriter::new();
        writer.add_mesh(&triangle(), None).unwrap();
        writer.add_mesh(&triangle(), None).unwrap();
        assert_eq!(writer.vertex_count(), 6);
        assert_eq!(writer.face_count(), 2);
        let mut bytes = Vec::new();
        writer.write_to(&mut bytes).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("f 4 5 6"));
    }
}
