use crate::status::{Status, TvmcError};
use crate::vector::{distance, Vector3d};

/// Square matrix of `f64`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.size.max(1)).take(self.size)
    }
}

/// Largest distance between every pair of centers over all frames:
/// `M[i][j] = max_f |c_f[i] - c_f[j]|`. Symmetric with a zero diagonal.
///
/// Every frame must hold the same number of centers.
pub fn max_distance_matrix(frames: &[Vec<Vector3d>]) -> Status<DistanceMatrix> {
    let first = frames
        .first()
        .ok_or(TvmcError::EmptyPointSet("no center frames"))?;
    let n = first.len();
    let mut matrix = DistanceMatrix::zeros(n);
    for frame in frames {
        if frame.len() != n {
            return Err(TvmcError::LengthMismatch {
                what: "center frame",
                expected: n,
                actual: frame.len(),
            });
        }
        for i in 0..n {
            for j in i + 1..n {
                let d = distance(frame[i], frame[j]);
                if d > matrix.get(i, j) {
                    matrix.set(i, j, d);
                    matrix.set(j, i, d);
                }
            }
        }
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_over_frames() {
        let frames = vec![
            vec![Vector3d::new(0.0, 0.0, 0.0), Vector3d::new(1.0, 0.0, 0.0)],
            vec![Vector3d::new(0.0, 0.0, 0.0), Vector3d::new(0.0, 3.0, 0.0)],
        ];
        let m = max_distance_matrix(&frames).unwrap();
        assert_eq!(m.size(), 2);
        assert_eq!(m.get(0, 1), 3.0);
        assert_eq!(m.get(1, 0), 3.0);
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.rows().count(), 2);
    }

    #[test]
    fn test_ragged_frames_rejected() {
        let frames = vec![vec![Vector3d::ZERO; 2], vec![Vector3d::ZERO; 3]];
        assert!(max_distance_matrix(&frames).is_err());
        assert!(max_distance_matrix(&[]).is_err());
    }
}
