use crate::vector::Vector3d;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3d,
    pub max: Vector3d,
}

impl BoundingBox {
    /// Bounding box of a point set, `None` when the set is empty.
    pub fn from_points(points: &[Vector3d]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Self { min: first, max: first };
        for &p in &points[1..] {
            bounds.expand(p);
        }
        Some(bounds)
    }

    pub fn expand(&mut self, p: Vector3d) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn extent(&self) -> Vector3d {
        self.max - self.min
    }

    /// Length of the box diagonal, the signal peak used by the PSNR metrics.
    pub fn diagonal(&self) -> f64 {
        self.extent().length()
    }

    pub fn center(&self) -> Vector3d {
        self.min.midpoint(self.max)
    }
}
