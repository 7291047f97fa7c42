use crate::point_cloud::PointCloud;
use crate::status::{Status, TvmcError};
use crate::vector::Vector3d;

/// Per-vertex offsets, index-aligned with the subdivided reference topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplacementField {
    vectors: Vec<Vector3d>,
}

impl DisplacementField {
    pub fn from_vectors(vectors: Vec<Vector3d>) -> Self {
        Self { vectors }
    }

    /// `resampled[i] - reference[i]` for every reference vertex.
    pub fn between(resampled: &[Vector3d], reference: &[Vector3d]) -> Status<Self> {
        if resampled.len() != reference.len() {
            return Err(TvmcError::LengthMismatch {
                what: "resampled vertices",
                expected: reference.len(),
                actual: resampled.len(),
            });
        }
        Ok(Self {
            vectors: resampled.iter().zip(reference).map(|(r, s)| *r - *s).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn vectors(&self) -> &[Vector3d] {
        &self.vectors
    }

    pub fn get(&self, index: usize) -> Vector3d {
        self.vectors[index]
    }

    /// Adds the field to `base`, which must have one position per entry.
    pub fn apply_to(&self, base: &[Vector3d]) -> Status<Vec<Vector3d>> {
        if base.len() != self.vectors.len() {
            return Err(TvmcError::LengthMismatch {
                what: "base positions",
                expected: self.vectors.len(),
                actual: base.len(),
            });
        }
        Ok(base.iter().zip(&self.vectors).map(|(p, d)| *p + *d).collect())
    }

    /// The field as a point cloud, the shape the codec consumes.
    pub fn to_point_cloud(&self) -> PointCloud {
        PointCloud::from_positions(self.vectors.clone())
    }
}

impl From<PointCloud> for DisplacementField {
    fn from(pc: PointCloud) -> Self {
        Self::from_vectors(pc.into_positions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_and_apply() {
        let reference = vec![Vector3d::new(0.0, 0.0, 0.0), Vector3d::new(1.0, 1.0, 1.0)];
        let resampled = vec![Vector3d::new(0.5, 0.0, 0.0), Vector3d::new(1.0, 2.0, 1.0)];
        let field = DisplacementField::between(&resampled, &reference).unwrap();
        assert_eq!(field.get(0), Vector3d::new(0.5, 0.0, 0.0));
        assert_eq!(field.get(1), Vector3d::new(0.0, 1.0, 0.0));
        assert_eq!(field.apply_to(&reference).unwrap(), resampled);
    }

    #[test]
    fn test_length_mismatch() {
        let err = DisplacementField::between(&[Vector3d::ZERO], &[]).unwrap_err();
        assert!(matches!(err, TvmcError::LengthMismatch { expected: 0, actual: 1, .. }));
    }
}
