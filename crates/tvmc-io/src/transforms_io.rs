//! Per-center dual quaternion files: one `rx;ry;rz;rw;dx;dy;dz;dw` line per
//! center, values in single precision.

use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tvmc_core::transforms::CenterTransforms;
use tvmc_core::DualQuaternion;

use crate::text_matrix::{read_indices, write_indices};
use crate::{check_exists, invalid_data};

pub fn write_transforms<P: AsRef<Path>>(path: P, transforms: &[DualQuaternion]) -> io::Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for t in transforms {
        let fields: Vec<String> = t.to_array().iter().map(|v| format!("{:?}", *v as f32)).collect();
        writeln!(out, "{}", fields.join(";"))?;
    }
    out.flush()
}

pub fn parse_transforms<R: BufRead>(reader: R) -> io::Result<Vec<DualQuaternion>> {
    let mut transforms = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.trim().split(';').collect();
        if fields.len() != 8 {
            return Err(invalid_data(format!(
                "line {}: {} fields, expected 8",
                i + 1,
                fields.len()
            )));
        }
        let mut values = [0.0f64; 8];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field
                .trim()
                .parse::<f32>()
                .map_err(|_| invalid_data(format!("line {}: bad value '{field}'", i + 1)))?
                as f64;
        }
        transforms.push(DualQuaternion::from_array(values));
    }
    Ok(transforms)
}

pub fn read_transforms<P: AsRef<Path>>(path: P) -> io::Result<Vec<DualQuaternion>> {
    let path = path.as_ref();
    check_exists(path)?;
    parse_transforms(BufReader::new(fs::File::open(path)?))
}

/// Indices of moved centers together with the full transform list.
pub fn read_indexed_transforms<P: AsRef<Path>, Q: AsRef<Path>>(
    indices_path: P,
    transforms_path: Q,
) -> io::Result<(Vec<usize>, Vec<DualQuaternion>)> {
    Ok((read_indices(indices_path)?, read_transforms(transforms_path)?))
}

/// Writes the indices, forward and inverse files of one frame.
pub fn write_center_transforms(
    transforms: &CenterTransforms,
    indices_path: &Path,
    forward_path: &Path,
    inverse_path: &Path,
) -> io::Result<()> {
    write_indices(indices_path, &transforms.moved)?;
    write_transforms(forward_path, &transforms.forward)?;
    write_transforms(inverse_path, &transforms.inverse)
}
