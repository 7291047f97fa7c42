//! PLY format reader for point clouds.
//!
//! The header is parsed in full so files written by other tools load too:
//! ASCII, binary little-endian and binary big-endian bodies are accepted,
//! and any element other than `vertex` (faces, for instance) is skipped,
//! list properties included. Only `x y z` and optional `nx ny nz` are kept.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;
use tvmc_core::{Mesh, PointCloud, Vector3d};

use crate::traits::{PointCloudReader, Reader};
use crate::{check_exists, from_status, invalid_data};

/// Upper bound on the up-front allocation for a declared vertex count; the
/// body has to back any count beyond it.
const MAX_RESERVED_POINTS: usize = 1 << 20;

/// PLY format reader.
#[derive(Debug)]
pub struct PlyReader {
    path: PathBuf,
}

impl PlyReader {
    /// Open a PLY file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_exists(&path)?;
        Ok(Self { path })
    }

    /// Read positions, and normals when present.
    pub fn read_point_cloud(&mut self) -> io::Result<PointCloud> {
        let file = fs::File::open(&self.path)?;
        let pc = parse_ply(BufReader::new(file))
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", self.path.display(), e)))?;
        debug!("read {}: {} points", self.path.display(), pc.num_points());
        Ok(pc)
    }
}

impl Reader for PlyReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        PlyReader::open(path)
    }

    fn read_meshes(&mut self) -> io::Result<Vec<Mesh>> {
        let pc = self.read_point_cloud()?;
        let normals = pc.normals().map(<[Vector3d]>::to_vec);
        let mut mesh = Mesh::from_parts(pc.into_positions(), Vec::new()).map_err(from_status)?;
        if let Some(normals) = normals {
            mesh.set_normals(normals).map_err(from_status)?;
        }
        Ok(vec![mesh])
    }
}

impl PointCloudReader for PlyReader {
    fn read_points(&mut self) -> io::Result<Vec<Vector3d>> {
        Ok(self.read_point_cloud()?.into_positions())
    }
}

/// Read point positions from a PLY file.
pub fn read_ply_points<P: AsRef<Path>>(path: P) -> io::Result<Vec<Vector3d>> {
    PlyReader::open(path)?.read_points()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl Scalar {
    fn parse(name: &str) -> io::Result<Self> {
        Ok(match name {
            "char" | "int8" => Scalar::I8,
            "uchar" | "uint8" => Scalar::U8,
            "short" | "int16" => Scalar::I16,
            "ushort" | "uint16" => Scalar::U16,
            "int" | "int32" => Scalar::I32,
            "uint" | "uint32" => Scalar::U32,
            "float" | "float32" => Scalar::F32,
            "double" | "float64" => Scalar::F64,
            other => return Err(invalid_data(format!("unknown PLY type '{other}'"))),
        })
    }

    fn read<B: ByteOrder, R: Read>(self, r: &mut R) -> io::Result<f64> {
        Ok(match self {
            Scalar::I8 => r.read_i8()? as f64,
            Scalar::U8 => r.read_u8()? as f64,
            Scalar::I16 => r.read_i16::<B>()? as f64,
            Scalar::U16 => r.read_u16::<B>()? as f64,
            Scalar::I32 => r.read_i32::<B>()? as f64,
            Scalar::U32 => r.read_u32::<B>()? as f64,
            Scalar::F32 => r.read_f32::<B>()? as f64,
            Scalar::F64 => r.read_f64::<B>()?,
        })
    }
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, kind: Scalar },
    List { count: Scalar, item: Scalar },
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    format: Format,
    elements: Vec<Element>,
}

fn next_line<R: BufRead>(reader: &mut R, line: &mut String) -> io::Result<bool> {
    line.clear();
    Ok(reader.read_line(line)? != 0)
}

fn parse_header<R: BufRead>(reader: &mut R) -> io::Result<Header> {
    let mut line = String::new();
    if !next_line(reader, &mut line)? || line.trim() != "ply" {
        return Err(invalid_data("missing 'ply' magic"));
    }
    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    loop {
        if !next_line(reader, &mut line)? {
            return Err(invalid_data("No end_header found"));
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["end_header"] => break,
            ["format", kind, _version] => {
                format = Some(match *kind {
                    "ascii" => Format::Ascii,
                    "binary_little_endian" => Format::BinaryLittleEndian,
                    "binary_big_endian" => Format::BinaryBigEndian,
                    other => return Err(invalid_data(format!("unknown PLY format '{other}'"))),
                });
            }
            ["element", name, count] => {
                let count = count
                    .parse()
                    .map_err(|_| invalid_data(format!("bad element count '{count}'")))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            ["property", "list", count, item, _name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| invalid_data("property before any element"))?;
                element.properties.push(Property::List {
                    count: Scalar::parse(count)?,
                    item: Scalar::parse(item)?,
                });
            }
            ["property", kind, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| invalid_data("property before any element"))?;
                element.properties.push(Property::Scalar {
                    name: name.to_string(),
                    kind: Scalar::parse(kind)?,
                });
            }
            ["comment", ..] | ["obj_info", ..] | [] => {}
            _ => return Err(invalid_data(format!("bad header line '{}'", line.trim()))),
        }
    }
    let format = format.ok_or_else(|| invalid_data("missing format line"))?;
    Ok(Header { format, elements })
}

/// Column positions of the attributes kept from the vertex element.
struct VertexLayout {
    position: [usize; 3],
    normal: Option<[usize; 3]>,
}

impl VertexLayout {
    fn from_element(element: &Element) -> io::Result<Self> {
        let find = |wanted: &str| {
            element
                .properties
                .iter()
                .position(|p| matches!(p, Property::Scalar { name, .. } if name == wanted))
        };
        let axis = |n: &str| find(n).ok_or_else(|| invalid_data(format!("No {n} property")));
        let position = [axis("x")?, axis("y")?, axis("z")?];
        let normal = match (find("nx"), find("ny"), find("nz")) {
            (Some(a), Some(b), Some(c)) => Some([a, b, c]),
            _ => None,
        };
        Ok(Self { position, normal })
    }
}

fn read_binary_row<B: ByteOrder, R: Read>(
    r: &mut R,
    element: &Element,
    row: &mut Vec<f64>,
) -> io::Result<()> {
    row.clear();
    for property in &element.properties {
        match property {
            Property::Scalar { kind, .. } => row.push(kind.read::<B, _>(r)?),
            Property::List { count, item } => {
                let n = count.read::<B, _>(r)? as usize;
                for _ in 0..n {
                    item.read::<B, _>(r)?;
                }
                // Lists never hold kept attributes; a placeholder keeps columns aligned.
                row.push(0.0);
            }
        }
    }
    Ok(())
}

fn read_ascii_row<R: BufRead>(r: &mut R, element: &Element, row: &mut Vec<f64>) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if r.read_line(&mut line)? == 0 {
            return Err(invalid_data(format!("truncated {} element", element.name)));
        }
        if !line.trim().is_empty() {
            break;
        }
    }
    let mut tokens = line.split_whitespace();
    // Values are rounded through their declared type, matching a binary body.
    let mut next = |kind: Scalar| -> io::Result<f64> {
        let t = tokens
            .next()
            .ok_or_else(|| invalid_data(format!("short {} row", element.name)))?;
        let bad = || invalid_data(format!("bad value '{t}' in {} row", element.name));
        match kind {
            Scalar::F32 => t.parse::<f32>().map(f64::from).map_err(|_| bad()),
            Scalar::F64 => t.parse::<f64>().map_err(|_| bad()),
            _ => t.parse::<i64>().map(|v| v as f64).map_err(|_| bad()),
        }
    };
    row.clear();
    for property in &element.properties {
        match property {
            Property::Scalar { kind, .. } => row.push(next(*kind)?),
            Property::List { count, item } => {
                let n = next(*count)? as usize;
                for _ in 0..n {
                    next(*item)?;
                }
                row.push(0.0);
            }
        }
    }
    Ok(())
}

/// Parse a PLY stream into a point cloud.
pub fn parse_ply<R: BufRead>(mut reader: R) -> io::Result<PointCloud> {
    let header = parse_header(&mut reader)?;
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut has_normals = false;
    let mut found_vertex = false;
    let mut row = Vec::new();

    for element in &header.elements {
        let layout = if element.name == "vertex" {
            found_vertex = true;
            let layout = VertexLayout::from_element(element)?;
            has_normals = layout.normal.is_some();
            positions.reserve(element.count.min(MAX_RESERVED_POINTS));
            Some(layout)
        } else {
            None
        };
        for _ in 0..element.count {
            match header.format {
                Format::Ascii => read_ascii_row(&mut reader, element, &mut row)?,
                Format::BinaryLittleEndian => read_binary_row::<LittleEndian, _>(&mut reader, element, &mut row)?,
                Format::BinaryBigEndian => read_binary_row::<BigEndian, _>(&mut reader, element, &mut row)?,
            }
            if let Some(layout) = &layout {
                let [x, y, z] = layout.position;
                positions.push(Vector3d::new(row[x], row[y], row[z]));
                if let Some([a, b, c]) = layout.normal {
                    normals.push(Vector3d::new(row[a], row[b], row[c]));
                }
            }
        }
        if layout.is_some() {
            // Anything after the vertices is irrelevant to a point cloud.
            break;
        }
    }
    if !found_vertex {
        return Err(invalid_data("no vertex element"));
    }

    let mut pc = PointCloud::from_positions(positions);
    if has_normals {
        pc.set_normals(normals).map_err(from_status)?;
    }
    Ok(pc)
}
