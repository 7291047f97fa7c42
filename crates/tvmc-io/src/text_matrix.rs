//! Whitespace-separated plain-text matrices, vectors and index lists.
//!
//! Rows are lines, columns are separated by any whitespace, blank lines are
//! skipped. Every row must have the same number of columns.

use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tvmc_core::{DisplacementField, DistanceMatrix, Vector3d};

use crate::{check_exists, invalid_data};

/// Parse a rectangular matrix of `f64`.
pub fn parse_matrix<R: BufRead>(reader: R) -> io::Result<Vec<Vec<f64>>> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| invalid_data(format!("line {}: bad number '{t}'", i + 1)))
            })
            .collect::<io::Result<Vec<f64>>>()?;
        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(invalid_data(format!(
                    "line {}: {} columns, expected {}",
                    i + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn read_matrix<P: AsRef<Path>>(path: P) -> io::Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    check_exists(path)?;
    parse_matrix(BufReader::new(fs::File::open(path)?))
}

/// Read an `n × 3` matrix as vectors.
pub fn read_vectors<P: AsRef<Path>>(path: P) -> io::Result<Vec<Vector3d>> {
    let rows = read_matrix(path)?;
    rows.iter()
        .map(|r| match r.as_slice() {
            [x, y, z] => Ok(Vector3d::new(*x, *y, *z)),
            other => Err(invalid_data(format!("expected 3 columns, found {}", other.len()))),
        })
        .collect()
}

/// Write vectors one per line with six decimals, `%8f` style.
pub fn write_vectors<P: AsRef<Path>>(path: P, vectors: &[Vector3d]) -> io::Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for v in vectors {
        writeln!(out, "{:8.6} {:8.6} {:8.6}", v.x, v.y, v.z)?;
    }
    out.flush()
}

pub fn read_displacements<P: AsRef<Path>>(path: P) -> io::Result<DisplacementField> {
    Ok(DisplacementField::from_vectors(read_vectors(path)?))
}

pub fn write_displacements<P: AsRef<Path>>(path: P, field: &DisplacementField) -> io::Result<()> {
    write_vectors(path, field.vectors())
}

/// Write a square matrix in full scientific precision.
pub fn write_distance_matrix<P: AsRef<Path>>(path: P, matrix: &DistanceMatrix) -> io::Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for row in matrix.rows() {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.18e}")).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()
}

pub fn write_indices<P: AsRef<Path>>(path: P, indices: &[usize]) -> io::Result<()> {
    let mut out = BufWriter::new(fs::File::create(path)?);
    for i in indices {
        writeln!(out, "{i}")?;
    }
    out.flush()
}

pub fn read_indices<P: AsRef<Path>>(path: P) -> io::Result<Vec<usize>> {
    let path = path.as_ref();
    check_exists(path)?;
    let reader = BufReader::new(fs::File::open(path)?);
    let mut indices = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let t = line.trim();
        if t.is_empty() {
            continue;
        }
        indices.push(t.parse().map_err(|_| invalid_data(format!("bad index '{t}'")))?);
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::NamedTempFile;

    #[test]
    fn test_vectors_six_decimals() {
        let file = NamedTempFile::new().unwrap();
        write_vectors(file.path(), &[Vector3d::new(0.1234567, -1.0, 2.5)]).unwrap();
        let text = fs::read_to_string(file.path()).unwrap();
        assert_eq!(text, "0.123457 -1.000000 2.500000\n");
        let back = read_vectors(file.path()).unwrap();
        assert_eq!(back, vec![Vector3d::new(0.123457, -1.0, 2.5)]);
    }

    #[test]
    fn test_ragged_matrix_rejected() {
        let err = parse_matrix(Cursor::new("1 2 3\n4 5\n")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let rows = parse_matrix(Cursor::new("1 2\n\n3 4\n")).unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_distance_matrix_parses_back() {
        let mut m = DistanceMatrix::zeros(2);
        m.set(0, 1, 0.75);
        m.set(1, 0, 0.75);
        let file = NamedTempFile::new().unwrap();
        write_distance_matrix(file.path(), &m).unwrap();
        let rows = read_matrix(file.path()).unwrap();
        assert_eq!(rows, vec![vec![0.0, 0.75], vec![0.75, 0.0]]);
    }

    #[test]
    fn test_indices() {
        let file = NamedTempFile::new().unwrap();
        write_indices(file.path(), &[3, 1, 4]).unwrap();
        assert_eq!(read_indices(file.path()).unwrap(), vec![3, 1, 4]);
    }
}
