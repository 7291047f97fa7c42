//! Bitrate accounting over the codec assets of one group of frames.

use serde::Serialize;
use thiserror::Error;

use crate::codec::{AssetKind, CodecAsset};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    #[error("no reference mesh asset was encoded")]
    MissingReference,
    #[error("{0} reference mesh assets, expected one")]
    DuplicateReference(usize),
    #[error("duration must be positive and finite, got {0} s")]
    Duration(f64),
}

/// Bits per second for `bytes` spread over `duration_s` seconds.
///
/// ```
/// use tvmc_tools::rate::bitrate;
///
/// // 1000 bytes over half a second
/// assert_eq!(bitrate(1000, 0.5), 16_000.0);
/// ```
pub fn bitrate(bytes: u64, duration_s: f64) -> f64 {
    bytes as f64 * 8.0 / duration_s
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BitrateReport {
    pub duration_s: f64,
    pub reference_bytes: u64,
    pub displacement_bytes: u64,
    pub displacement_assets: usize,
    pub total_bps: f64,
    pub reference_bps: f64,
    pub displacement_bps: f64,
}

impl BitrateReport {
    /// Totals `assets`: every displacement asset plus exactly one reference
    /// mesh asset.
    pub fn from_assets(assets: &[CodecAsset], duration_s: f64) -> Result<Self, RateError> {
        if !(duration_s.is_finite() && duration_s > 0.0) {
            return Err(RateError::Duration(duration_s));
        }
        let references: Vec<&CodecAsset> = assets
            .iter()
            .filter(|a| a.kind == AssetKind::ReferenceMesh)
            .collect();
        let reference_bytes = match references.as_slice() {
            [] => return Err(RateError::MissingReference),
            [one] => one.size,
            many => return Err(RateError::DuplicateReference(many.len())),
        };
        let displacements = assets.iter().filter(|a| a.kind == AssetKind::DisplacementField);
        let displacement_assets = displacements.clone().count();
        let displacement_bytes: u64 = displacements.map(|a| a.size).sum();
        let total = reference_bytes + displacement_bytes;
        Ok(Self {
            duration_s,
            reference_bytes,
            displacement_bytes,
            displacement_assets,
            total_bps: bitrate(total, duration_s),
            reference_bps: bitrate(reference_bytes, duration_s),
            displacement_bps: bitrate(displacement_bytes, duration_s),
        })
    }

    pub fn total_bytes(&self) -> u64 {
        self.reference_bytes + self.displacement_bytes
    }

    pub fn total_mbps(&self) -> f64 {
        self.total_bps / 1e6
    }

    pub fn reference_mbps(&self) -> f64 {
        self.reference_bps / 1e6
    }

    pub fn displacement_mbps(&self) -> f64 {
        self.displacement_bps / 1e6
    }
}
