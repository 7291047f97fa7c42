//! Volume center files.
//!
//! `.xyz`: one `x y z` triple per line. `.bin`: little-endian `i32` count
//! followed by `count` triples of `f32`.

use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use tvmc_core::Vector3d;

use crate::text_matrix::{read_vectors, write_vectors};
use crate::{check_exists, invalid_data};

fn is_center_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("xyz") | Some("bin")
    )
}

/// Read a center file, format chosen by extension.
pub fn read_centers<P: AsRef<Path>>(path: P) -> io::Result<Vec<Vector3d>> {
    let path = path.as_ref();
    check_exists(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("xyz") => read_vectors(path),
        Some("bin") => read_centers_bin(BufReader::new(fs::File::open(path)?)),
        _ => Err(invalid_data(format!(
            "{}: center files must be .xyz or .bin",
            path.display()
        ))),
    }
}

pub fn read_centers_bin<R: Read>(mut reader: R) -> io::Result<Vec<Vector3d>> {
    let count = reader.read_i32::<LittleEndian>()?;
    if count < 0 {
        return Err(invalid_data(format!("negative center count {count}")));
    }
    let mut centers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        centers.push(Vector3d::from([x, y, z]));
    }
    Ok(centers)
}

pub fn write_centers_bin<P: AsRef<Path>>(path: P, centers: &[Vector3d]) -> io::Result<()> {
    let count = i32::try_from(centers.len())
        .map_err(|_| invalid_data(format!("{} centers do not fit a .bin count", centers.len())))?;
    let mut out = BufWriter::new(fs::File::create(path)?);
    out.write_i32::<LittleEndian>(count)?;
    for c in centers {
        out.write_f32::<LittleEndian>(c.x as f32)?;
        out.write_f32::<LittleEndian>(c.y as f32)?;
        out.write_f32::<LittleEndian>(c.z as f32)?;
    }
    out.flush()
}

pub fn write_centers_xyz<P: AsRef<Path>>(path: P, centers: &[Vector3d]) -> io::Result<()> {
    write_vectors(path, centers)
}

/// Center files in `dir`, sorted by file name.
pub fn list_center_files<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    check_exists(dir)?;
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_center_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Centers of the first `limit` files of `dir` (all when `None`).
pub fn read_center_frames<P: AsRef<Path>>(dir: P, limit: Option<usize>) -> io::Result<Vec<Vec<Vector3d>>> {
    let mut files = list_center_files(dir)?;
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    files
        .iter()
        .map(|f| {
            debug!("loading centers {}", f.display());
            read_centers(f)
        })
        .collect()
}
