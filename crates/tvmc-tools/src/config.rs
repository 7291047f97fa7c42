//! Run configuration.
//!
//! A [`RunConfig`] is built once from the command line, validated, and only
//! read afterwards.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use log::warn;
use thiserror::Error;

use crate::codec::EncodeSettings;
use crate::layout::DatasetLayout;

pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Largest quantization parameter the codec accepts.
pub const MAX_QP: u32 = 30;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("dataset name is empty")]
    EmptyDataset,
    #[error("first index {first} is after last index {last}")]
    IndexRange { first: usize, last: usize },
    #[error("frame count must be positive")]
    NoFrames,
    #[error("frame rate must be positive and finite, got {0}")]
    FrameRate(f64),
    #[error("quantization parameter {0} is outside 0..={MAX_QP}")]
    Qp(u32),
}

/// Encode settings of both asset classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSettings {
    pub reference: EncodeSettings,
    pub displacement: EncodeSettings,
}

impl CodecSettings {
    pub fn for_qp(qp: u32) -> Self {
        Self {
            reference: EncodeSettings::REFERENCE_MESH,
            displacement: EncodeSettings::displacement(qp),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub dataset: String,
    /// Frames in the group; sets the duration used for bitrate.
    pub num_frames: usize,
    pub num_centers: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub file_name_prefix: String,
    pub encoder_path: PathBuf,
    pub decoder_path: PathBuf,
    pub qp: u32,
    /// Directory receiving reconstructed meshes.
    pub output_path: PathBuf,
    /// Root holding `Data/` and `output/`.
    pub workspace: PathBuf,
    pub frame_rate: f64,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.is_empty() {
            return Err(ConfigError::EmptyDataset);
        }
        if self.first_index > self.last_index {
            return Err(ConfigError::IndexRange {
                first: self.first_index,
                last: self.last_index,
            });
        }
        if self.num_frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }
        if self.qp > MAX_QP {
            return Err(ConfigError::Qp(self.qp));
        }
        if self.frame_count_in_range() != self.num_frames {
            warn!(
                "frame count {} differs from index range {}..={} ({} frames); bitrate uses {}",
                self.num_frames,
                self.first_index,
                self.last_index,
                self.frame_count_in_range(),
                self.num_frames
            );
        }
        Ok(())
    }

    pub fn frame_indices(&self) -> RangeInclusive<usize> {
        self.first_index..=self.last_index
    }

    pub fn frame_count_in_range(&self) -> usize {
        self.frame_indices().count()
    }

    /// Seconds of content covered by the group.
    pub fn duration_s(&self) -> f64 {
        self.num_frames as f64 / self.frame_rate
    }

    pub fn codec_settings(&self) -> CodecSettings {
        CodecSettings::for_qp(self.qp)
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.workspace, &self.dataset, self.num_centers, self.num_frames)
            .with_prefix(&self.file_name_prefix)
            .with_reconstruction_dir(&self.output_path)
    }
}

#[cfg(test)]
pub(crate) fn test_config(workspace: &std::path::Path) -> RunConfig {
    RunConfig {
        dataset: "cube".to_string(),
        num_frames: 1,
        num_centers: 4,
        first_index: 1,
        last_index: 1,
        file_name_prefix: "cube_fr".to_string(),
        encoder_path: PathBuf::from("draco_encoder"),
        decoder_path: PathBuf::from("draco_decoder"),
        qp: 11,
        output_path: workspace.join("reconstructed"),
        workspace: workspace.to_path_buf(),
        frame_rate: DEFAULT_FRAME_RATE,
    }
}
