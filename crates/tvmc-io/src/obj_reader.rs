//! OBJ format reader.
//!
//! Reads positions (with optional `v x y z r g b` colours), texture
//! coordinates, normals and polygonal faces. Polygons are fan-triangulated
//! and negative (relative) indices are resolved against the elements read so
//! far. Groups, materials and smoothing groups are skipped.
//!
//! Texture coordinates are kept per triangle corner. A file where some faces
//! carry texture indices and others do not is rejected: the per-corner
//! buffer would not line up with the triangles.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;
use tvmc_core::{Face, Mesh, Vector3d, VertexIndex};

use crate::traits::{PointCloudReader, Reader};
use crate::{check_exists, from_status, invalid_data};

/// OBJ format reader.
#[derive(Debug)]
pub struct ObjReader {
    path: PathBuf,
}

impl ObjReader {
    /// Open an OBJ file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_exists(&path)?;
        Ok(Self { path })
    }

    pub fn read_mesh(&mut self) -> io::Result<Mesh> {
        read_obj(&self.path)
    }
}

impl Reader for ObjReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        ObjReader::open(path)
    }

    fn read_meshes(&mut self) -> io::Result<Vec<Mesh>> {
        Ok(vec![self.read_mesh()?])
    }
}

impl PointCloudReader for ObjReader {
    fn read_points(&mut self) -> io::Result<Vec<Vector3d>> {
        Ok(self.read_mesh()?.into_point_cloud().into_positions())
    }
}

/// Read a mesh from an OBJ file.
pub fn read_obj<P: AsRef<Path>>(path: P) -> io::Result<Mesh> {
    let path = path.as_ref();
    check_exists(path)?;
    let file = fs::File::open(path)?;
    let mesh = parse_obj(BufReader::new(file))
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;
    debug!(
        "read {}: {} vertices, {} faces",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    vertex: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

fn parse_floats<'a>(
    tokens: impl Iterator<Item = &'a str>,
    line_no: usize,
) -> io::Result<Vec<f64>> {
    tokens
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| invalid_data(format!("line {line_no}: bad number '{t}'")))
        })
        .collect()
}

/// Resolves a 1-based or negative OBJ index against `count` elements.
fn resolve(token: &str, count: usize, what: &str, line_no: usize) -> io::Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| invalid_data(format!("line {line_no}: bad {what} index '{token}'")))?;
    let resolved = if raw > 0 {
        raw - 1
    } else if raw < 0 {
        count as i64 + raw
    } else {
        -1
    };
    if resolved < 0 {
        return Err(invalid_data(format!(
            "line {line_no}: {what} index {raw} does not resolve"
        )));
    }
    Ok(resolved as usize)
}

fn parse_corner(
    token: &str,
    counts: (usize, usize, usize),
    line_no: usize,
) -> io::Result<Corner> {
    let mut parts = token.split('/');
    let vertex = match parts.next() {
        Some(v) if !v.is_empty() => resolve(v, counts.0, "vertex", line_no)?,
        _ => return Err(invalid_data(format!("line {line_no}: corner '{token}' has no vertex"))),
    };
    let texcoord = match parts.next() {
        Some(t) if !t.is_empty() => Some(resolve(t, counts.1, "texture", line_no)?),
        _ => None,
    };
    let normal = match parts.next() {
        Some(n) if !n.is_empty() => Some(resolve(n, counts.2, "normal", line_no)?),
        _ => None,
    };
    Ok(Corner {
        vertex,
        texcoord,
        normal,
    })
}

/// Parse OBJ text into a validated mesh.
pub fn parse_obj<R: BufRead>(reader: R) -> io::Result<Mesh> {
    let mut positions: Vec<Vector3d> = Vec::new();
    let mut colors: Vec<Vector3d> = Vec::new();
    let mut texcoords: Vec<[f64; 2]> = Vec::new();
    let mut normals: Vec<Vector3d> = Vec::new();
    let mut triangles: Vec<[Corner; 3]> = Vec::new();
    let mut faces_have_uvs: Option<bool> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };
        match tag {
            "v" => {
                let values = parse_floats(tokens, line_no)?;
                match values.len() {
                    3 | 4 => {}
                    6 => colors.push(Vector3d::new(values[3], values[4], values[5])),
                    n => {
                        return Err(invalid_data(format!(
                            "line {line_no}: vertex has {n} components"
                        )))
                    }
                }
                positions.push(Vector3d::new(values[0], values[1], values[2]));
            }
            "vt" => {
                let values = parse_floats(tokens, line_no)?;
                if values.len() < 2 {
                    return Err(invalid_data(format!(
                        "line {line_no}: texture coordinate needs two components"
                    )));
                }
                texcoords.push([values[0], values[1]]);
            }
            "vn" => {
                let values = parse_floats(tokens, line_no)?;
                if values.len() != 3 {
                    return Err(invalid_data(format!(
                        "line {line_no}: normal needs three components"
                    )));
                }
                normals.push(Vector3d::new(values[0], values[1], values[2]));
            }
            "f" => {
                let counts = (positions.len(), texcoords.len(), normals.len());
                let corners = tokens
                    .map(|t| parse_corner(t, counts, line_no))
                    .collect::<io::Result<Vec<Corner>>>()?;
                if corners.len() < 3 {
                    return Err(invalid_data(format!(
                        "line {line_no}: face has {} corners",
                        corners.len()
                    )));
                }
                let with_uvs = corners.iter().filter(|c| c.texcoord.is_some()).count();
                if with_uvs != 0 && with_uvs != corners.len() {
                    return Err(invalid_data(format!(
                        "line {line_no}: face mixes corners with and without texture coordinates"
                    )));
                }
                let has_uvs = with_uvs != 0;
                match faces_have_uvs {
                    None => faces_have_uvs = Some(has_uvs),
                    Some(expected) if expected != has_uvs => {
                        return Err(invalid_data(format!(
                            "line {line_no}: faces mix texture coordinates and none"
                        )))
                    }
                    Some(_) => {}
                }
                for k in 1..corners.len() - 1 {
                    triangles.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    if !colors.is_empty() && colors.len() != positions.len() {
        return Err(invalid_data(format!(
            "{} of {} vertices carry a colour",
            colors.len(),
            positions.len()
        )));
    }

    let faces: Vec<Face> = triangles
        .iter()
        .map(|t| t.map(|c| VertexIndex::from(c.vertex)))
        .collect();
    let num_vertices = positions.len();
    let mut mesh = Mesh::from_parts(positions, faces).map_err(from_status)?;

    if !colors.is_empty() {
        mesh.set_colors(colors).map_err(from_status)?;
    }

    if faces_have_uvs == Some(true) {
        let mut uvs = Vec::with_capacity(triangles.len() * 3);
        for corner in triangles.iter().flatten() {
            let t = corner.texcoord.unwrap_or(usize::MAX);
            let uv = texcoords
                .get(t)
                .ok_or_else(|| invalid_data(format!("texture index {t} out of range")))?;
            uvs.push(*uv);
        }
        mesh.set_triangle_uvs(uvs).map_err(from_status)?;
    }

    if let Some(vertex_normals) = gather_normals(&triangles, &normals, num_vertices)? {
        mesh.set_normals(vertex_normals).map_err(from_status)?;
    }

    Ok(mesh)
}

/// Per-vertex normals from corner references, first reference wins.
/// Falls back to index-aligned `vn` lines when faces reference none.
fn gather_normals(
    triangles: &[[Corner; 3]],
    normals: &[Vector3d],
    num_vertices: usize,
) -> io::Result<Option<Vec<Vector3d>>> {
    if normals.is_empty() {
        return Ok(None);
    }
    let mut assigned: Vec<Option<Vector3d>> = vec![None; num_vertices];
    let mut referenced = false;
    for corner in triangles.iter().flatten() {
        if let Some(n) = corner.normal {
            referenced = true;
            let normal = normals
                .get(n)
                .ok_or_else(|| invalid_data(format!("normal index {n} out of range")))?;
            if assigned[corner.vertex].is_none() {
                assigned[corner.vertex] = Some(*normal);
            }
        }
    }
    if !referenced {
        if normals.len() == num_vertices {
            return Ok(Some(normals.to_vec()));
        }
        debug!("dropping {} unreferenced normals", normals.len());
        return Ok(None);
    }
    let complete: Option<Vec<Vector3d>> = assigned.into_iter().collect();
    if complete.is_none() {
        debug!("dropping normals: not every vertex is referenced with one");
    }
    Ok(complete)
}
