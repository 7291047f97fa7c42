//! Per-center rigid transforms as dual quaternions.
//!
//! Only translation is derived: every transform has an identity rotation.
//! A center whose position is bit-identical in the frame and the reference
//! did not move and gets the all-zero tuple instead of an identity.

use std::ops::Mul;

use crate::status::{Status, TvmcError};
use crate::vector::Vector3d;

/// Quaternion stored as `(x, y, z, w)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Pure quaternion `(v, 0)`.
    pub fn from_vector(v: Vector3d) -> Self {
        Self::new(v.x, v.y, v.z, 0.0)
    }

    pub fn vector(self) -> Vector3d {
        Vector3d::new(self.x, self.y, self.z)
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn scale(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl Mul for Quaternion {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        Self::new(
            self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
            self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
            self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
            self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
        )
    }
}

/// Rigid transform `real + ε·dual`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DualQuaternion {
    pub real: Quaternion,
    pub dual: Quaternion,
}

impl DualQuaternion {
    /// Placeholder for centers that did not move.
    pub const ZERO: Self = Self {
        real: Quaternion::ZERO,
        dual: Quaternion::ZERO,
    };

    /// Pure translation by `t`.
    pub fn from_translation(t: Vector3d) -> Self {
        Self {
            real: Quaternion::IDENTITY,
            dual: Quaternion::from_vector(t).scale(0.5),
        }
    }

    /// Inverse of [`Self::from_translation`]: conjugated rotation, negated dual.
    pub fn inverse_translation(t: Vector3d) -> Self {
        Self {
            real: Quaternion::IDENTITY.conjugate(),
            dual: Quaternion::from_vector(t).scale(-0.5),
        }
    }

    /// Translation part, `2·dual·conj(real)`.
    pub fn translation(&self) -> Vector3d {
        (self.dual * self.real.conjugate()).vector() * 2.0
    }

    /// `[rx, ry, rz, rw, dx, dy, dz, dw]`.
    pub fn to_array(self) -> [f64; 8] {
        let (r, d) = (self.real, self.dual);
        [r.x, r.y, r.z, r.w, d.x, d.y, d.z, d.w]
    }

    pub fn from_array(a: [f64; 8]) -> Self {
        Self {
            real: Quaternion::new(a[0], a[1], a[2], a[3]),
            dual: Quaternion::new(a[4], a[5], a[6], a[7]),
        }
    }
}

/// Transforms of every center of one frame toward the reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CenterTransforms {
    /// Indices of centers whose position changed, ascending.
    pub moved: Vec<usize>,
    /// One entry per center, frame to reference.
    pub forward: Vec<DualQuaternion>,
    /// One entry per center, reference to frame.
    pub inverse: Vec<DualQuaternion>,
}

/// Derives translation-only transforms taking `frame` centers onto the
/// matching `reference` centers.
pub fn center_transforms(frame: &[Vector3d], reference: &[Vector3d]) -> Status<CenterTransforms> {
    if frame.len() != reference.len() {
        return Err(TvmcError::LengthMismatch {
            what: "frame centers",
            expected: reference.len(),
            actual: frame.len(),
        });
    }
    let mut out = CenterTransforms {
        moved: Vec::new(),
        forward: vec![DualQuaternion::ZERO; frame.len()],
        inverse: vec![DualQuaternion::ZERO; frame.len()],
    };
    for (i, (f, r)) in frame.iter().zip(reference).enumerate() {
        if f == r {
            continue;
        }
        let t = *r - *f;
        out.moved.push(i);
        out.forward[i] = DualQuaternion::from_translation(t);
        out.inverse[i] = DualQuaternion::inverse_translation(t);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moved_and_unmoved() {
        let frame = vec![Vector3d::new(0.0, 0.0, 0.0), Vector3d::new(1.0, 1.0, 1.0)];
        let reference = vec![Vector3d::new(0.0, 0.0, 0.0), Vector3d::new(3.0, 1.0, 0.0)];
        let t = center_transforms(&frame, &reference).unwrap();
        assert_eq!(t.moved, vec![1]);
        assert_eq!(t.forward[0], DualQuaternion::ZERO);
        assert_eq!(
            t.forward[1].to_array(),
            [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, -0.5, 0.0]
        );
        assert_eq!(t.forward[1].translation(), Vector3d::new(2.0, 0.0, -1.0));
        assert_eq!(t.inverse[1].translation(), Vector3d::new(-2.0, 0.0, 1.0));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(center_transforms(&[Vector3d::ZERO], &[]).is_err());
    }

    #[test]
    fn test_array_layout() {
        let q = DualQuaternion::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(q.real.w, 4.0);
        assert_eq!(q.dual.x, 5.0);
        assert_eq!(q.to_array()[7], 8.0);
    }
}
