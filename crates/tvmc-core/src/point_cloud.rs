use crate::bounds::BoundingBox;
use crate::status::{Status, TvmcError};
use crate::vector::Vector3d;

/// Ordered 3D positions with optional per-point normals and colours.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointCloud {
    positions: Vec<Vector3d>,
    normals: Option<Vec<Vector3d>>,
    colors: Option<Vec<Vector3d>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: Vec<Vector3d>) -> Self {
        Self {
            positions,
            normals: None,
            colors: None,
        }
    }

    pub fn num_points(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vector3d] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vector3d] {
        &mut self.positions
    }

    pub fn position(&self, index: usize) -> Vector3d {
        self.positions[index]
    }

    pub fn into_positions(self) -> Vec<Vector3d> {
        self.positions
    }

    /// Replaces every position. Per-point attributes stay attached, so the
    /// new buffer must keep the point count.
    pub fn set_positions(&mut self, positions: Vec<Vector3d>) -> Status {
        if positions.len() != self.positions.len() {
            return Err(TvmcError::LengthMismatch {
                what: "positions",
                expected: self.positions.len(),
                actual: positions.len(),
            });
        }
        self.positions = positions;
        Ok(())
    }

    pub(crate) fn push_position(&mut self, position: Vector3d) -> usize {
        self.positions.push(position);
        self.positions.len() - 1
    }

    pub fn normals(&self) -> Option<&[Vector3d]> {
        self.normals.as_deref()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn set_normals(&mut self, normals: Vec<Vector3d>) -> Status {
        self.check_attribute_len("normals", normals.len())?;
        self.normals = Some(normals);
        Ok(())
    }

    pub fn clear_normals(&mut self) {
        self.normals = None;
    }

    pub fn colors(&self) -> Option<&[Vector3d]> {
        self.colors.as_deref()
    }

    pub fn set_colors(&mut self, colors: Vec<Vector3d>) -> Status {
        self.check_attribute_len("colors", colors.len())?;
        self.colors = Some(colors);
        Ok(())
    }

    /// Installs normals whose length the caller already guarantees.
    pub(crate) fn replace_normals(&mut self, normals: Vec<Vector3d>) {
        debug_assert_eq!(normals.len(), self.positions.len());
        self.normals = Some(normals);
    }

    pub(crate) fn normals_mut(&mut self) -> Option<&mut Vec<Vector3d>> {
        self.normals.as_mut()
    }

    pub(crate) fn colors_mut(&mut self) -> Option<&mut Vec<Vector3d>> {
        self.colors.as_mut()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.positions)
    }

    fn check_attribute_len(&self, what: &'static str, len: usize) -> Status {
        if len != self.positions.len() {
            return Err(TvmcError::AttributeMismatch(format!(
                "{what} has {len} entries for {} points",
                self.positions.len()
            )));
        }
        Ok(())
    }
}

impl From<Vec<Vector3d>> for PointCloud {
    fn from(positions: Vec<Vector3d>) -> Self {
        Self::from_positions(positions)
    }
}
