//! Pipeline driver.
//!
//! One run walks nine stages in order. Every frame finishes a stage before
//! any frame enters the next, and each stage hands its results to the next
//! as plain values. The first failure aborts the run; files written by
//! earlier stages stay on disk.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use tvmc_core::math_utils::mean;
use tvmc_core::resample::displacement_field;
use tvmc_core::{
    resample_onto, subdivided, DisplacementField, DistortionEvaluator, DistortionSample, DistortionSummary, Mesh,
    Reconstructor, TvmcError, Vector3d,
};
use tvmc_io::{read_obj, read_ply_points, write_displacements, write_obj, write_ply_points};

use crate::codec::{AssetKind, Codec, CodecAsset, CodecError, CodecOrchestrator, DecodedAsset};
use crate::config::{ConfigError, RunConfig};
use crate::layout::DatasetLayout;
use crate::rate::{BitrateReport, RateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    LoadReference,
    BuildDisplacements,
    EncodeReference,
    EncodeDisplacements,
    DecodeReference,
    DecodeDisplacements,
    ReconstructPerFrame,
    Evaluate,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::LoadReference,
        Stage::BuildDisplacements,
        Stage::EncodeReference,
        Stage::EncodeDisplacements,
        Stage::DecodeReference,
        Stage::DecodeDisplacements,
        Stage::ReconstructPerFrame,
        Stage::Evaluate,
        Stage::Report,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::LoadReference => "LOAD_REFERENCE",
            Stage::BuildDisplacements => "BUILD_DISPLACEMENTS",
            Stage::EncodeReference => "ENCODE_REFERENCE",
            Stage::EncodeDisplacements => "ENCODE_DISPLACEMENTS",
            Stage::DecodeReference => "DECODE_REFERENCE",
            Stage::DecodeDisplacements => "DECODE_DISPLACEMENTS",
            Stage::ReconstructPerFrame => "RECONSTRUCT_PER_FRAME",
            Stage::Evaluate => "EVALUATE",
            Stage::Report => "REPORT",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{stage}: {path}: {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{stage}: {source}")]
    Geometry {
        stage: Stage,
        #[source]
        source: TvmcError,
    },
    #[error("{stage}: {source}")]
    Codec {
        stage: Stage,
        #[source]
        source: CodecError,
    },
    #[error("{stage}: {source}")]
    Rate {
        stage: Stage,
        #[source]
        source: RateError,
    },
    #[error("{stage}: displacement asset {} carries no frame index", path.display())]
    UntaggedAsset { stage: Stage, path: PathBuf },
}

impl PipelineError {
    /// Stage that failed; `None` when the run never started.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Config(_) => None,
            PipelineError::Io { stage, .. }
            | PipelineError::Geometry { stage, .. }
            | PipelineError::Codec { stage, .. }
            | PipelineError::Rate { stage, .. }
            | PipelineError::UntaggedAsset { stage, .. } => Some(*stage),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

fn io_error(stage: Stage, path: &Path) -> impl FnOnce(io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    }
}

fn geometry_error(stage: Stage) -> impl FnOnce(TvmcError) -> PipelineError {
    move |source| PipelineError::Geometry { stage, source }
}

fn codec_error(stage: Stage) -> impl FnOnce(CodecError) -> PipelineError {
    move |source| PipelineError::Codec { stage, source }
}

fn create_dir(stage: Stage, dir: &Path) -> PipelineResult<()> {
    fs::create_dir_all(dir).map_err(io_error(stage, dir))
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Decimated reference and its once-subdivided topology.
#[derive(Debug, Clone)]
pub struct ReferenceTopology {
    pub decimated: Mesh,
    pub subdivided: Mesh,
}

/// Ground truth and displacement of one frame.
#[derive(Debug, Clone)]
pub struct FrameDisplacement {
    pub frame: usize,
    pub ground_truth: Mesh,
    pub field: DisplacementField,
}

#[derive(Debug, Clone)]
pub struct EncodedAssets {
    pub reference: CodecAsset,
    pub displacements: Vec<CodecAsset>,
}

impl EncodedAssets {
    pub fn all(&self) -> Vec<CodecAsset> {
        let mut assets = Vec::with_capacity(self.displacements.len() + 1);
        assets.push(self.reference.clone());
        assets.extend(self.displacements.iter().cloned());
        assets
    }
}

#[derive(Debug, Clone)]
pub struct DecodedReference {
    pub asset: DecodedAsset,
    pub reconstructor: Reconstructor,
    pub subdivision_ms: f64,
}

#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub asset: DecodedAsset,
    pub frame: usize,
    pub displacements: Vec<Vector3d>,
}

#[derive(Debug, Clone)]
pub struct ReconstructedFrame {
    pub frame: usize,
    pub path: PathBuf,
    pub mesh: Mesh,
    pub realign_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: usize,
    pub d1_psnr: f64,
    pub d2_psnr: f64,
    pub log_mse: f64,
    pub log_rmse: f64,
    pub hausdorff: f64,
}

impl FrameReport {
    fn new(frame: usize, sample: DistortionSample) -> Self {
        Self {
            frame,
            d1_psnr: sample.d1_psnr,
            d2_psnr: sample.d2_psnr,
            log_mse: sample.log_mse,
            log_rmse: sample.log_rmse,
            hausdorff: sample.hausdorff,
        }
    }

    fn sample(&self) -> DistortionSample {
        DistortionSample {
            d1_psnr: self.d1_psnr,
            d2_psnr: self.d2_psnr,
            log_mse: self.log_mse,
            log_rmse: self.log_rmse,
            hausdorff: self.hausdorff,
        }
    }
}

/// Codec and reconstruction timing. Means skip assets without timing text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingReport {
    pub mean_encode_ms: Option<f64>,
    pub mean_decode_ms: Option<f64>,
    pub reference_decode_ms: Option<u64>,
    pub subdivision_ms: f64,
    pub mean_realign_ms: f64,
    /// Reference decode, displacement decodes, subdivision and mean realignment.
    pub decode_time_ms: f64,
}

impl TimingReport {
    fn new(
        encoded: &EncodedAssets,
        reference: &DecodedReference,
        decoded: &[DecodedFrame],
        reconstructed: &[ReconstructedFrame],
    ) -> Self {
        let encode: Vec<f64> = encoded
            .displacements
            .iter()
            .filter_map(|a| a.encode_ms)
            .map(|ms| ms as f64)
            .collect();
        let decode: Vec<f64> = decoded
            .iter()
            .filter_map(|d| d.asset.decode_ms)
            .map(|ms| ms as f64)
            .collect();
        let realign: Vec<f64> = reconstructed.iter().map(|r| r.realign_ms).collect();
        let mean_realign_ms = mean(&realign).unwrap_or(0.0);
        let reference_decode_ms = reference.asset.decode_ms;
        let decode_time_ms = reference_decode_ms.unwrap_or(0) as f64
            + decode.iter().sum::<f64>()
            + reference.subdivision_ms
            + mean_realign_ms;
        Self {
            mean_encode_ms: mean(&encode),
            mean_decode_ms: mean(&decode),
            reference_decode_ms,
            subdivision_ms: reference.subdivision_ms,
            mean_realign_ms,
            decode_time_ms,
        }
    }
}

/// Everything one run measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub dataset: String,
    pub qp: u32,
    pub num_frames: usize,
    pub bitrate: BitrateReport,
    pub timing: TimingReport,
    pub frames: Vec<FrameReport>,
    pub d1_mean: Option<f64>,
    pub d2_mean: Option<f64>,
    pub log_mse_mean: Option<f64>,
    pub log_rmse_mean: Option<f64>,
    pub hausdorff_mean: Option<f64>,
}

/// The line an outer sweep reads from stdout. Non-finite values are `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryLine {
    pub bitrate_mbps: f64,
    pub d2s_mean: f64,
}

impl SummaryLine {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl RunSummary {
    pub fn summary_line(&self) -> SummaryLine {
        SummaryLine {
            bitrate_mbps: self.bitrate.total_mbps(),
            d2s_mean: self.d2_mean.unwrap_or(f64::NAN),
        }
    }
}

pub struct Pipeline<'a, C> {
    config: &'a RunConfig,
    layout: DatasetLayout,
    codec: CodecOrchestrator<C>,
}

impl<'a, C: Codec> Pipeline<'a, C> {
    pub fn new(config: &'a RunConfig, codec: C) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            layout: config.layout(),
            codec: CodecOrchestrator::new(codec),
        })
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn run(&self) -> PipelineResult<RunSummary> {
        info!(
            "evaluating {} frames {}..={} at qp {}",
            self.config.dataset, self.config.first_index, self.config.last_index, self.config.qp
        );
        let reference = self.load_reference()?;
        let frames = self.build_displacements(&reference)?;
        let reference_asset = self.encode_reference()?;
        let encoded = EncodedAssets {
            reference: reference_asset,
            displacements: self.encode_displacements()?,
        };
        let decoded_reference = self.decode_reference(&reference, &encoded.reference)?;
        let decoded = self.decode_displacements(&encoded.displacements)?;
        let reconstructed = self.reconstruct(&decoded_reference, &frames, &decoded)?;
        let reports = self.evaluate(&frames, &reconstructed)?;
        self.report(&encoded, &decoded_reference, &decoded, &reconstructed, reports)
    }

    fn enter(&self, stage: Stage) {
        info!("stage {stage}");
    }

    pub fn load_reference(&self) -> PipelineResult<ReferenceTopology> {
        let stage = Stage::LoadReference;
        self.enter(stage);
        let path = self.layout.decimated_reference();
        let decimated = read_obj(&path).map_err(io_error(stage, &path))?;
        let subdivided = subdivided(&decimated, tvmc_core::resample::SUBDIVISION_LEVEL);
        info!(
            "reference: {} vertices, {} faces; subdivided: {} vertices, {} faces",
            decimated.num_vertices(),
            decimated.num_faces(),
            subdivided.num_vertices(),
            subdivided.num_faces()
        );
        Ok(ReferenceTopology { decimated, subdivided })
    }

    /// Resamples each frame's deformed reference onto its ground truth and
    /// writes the fitted mesh, the raw displacement matrix and the point
    /// cloud handed to the encoder.
    pub fn build_displacements(&self, reference: &ReferenceTopology) -> PipelineResult<Vec<FrameDisplacement>> {
        let stage = Stage::BuildDisplacements;
        self.enter(stage);
        let mut frames = Vec::with_capacity(self.config.frame_count_in_range());
        for frame in self.config.frame_indices() {
            let deformed_path = self.layout.deformed_reference(frame);
            let deformed = read_obj(&deformed_path).map_err(io_error(stage, &deformed_path))?;
            let truth_path = self.layout.frame_mesh(frame);
            let ground_truth = read_obj(&truth_path).map_err(io_error(stage, &truth_path))?;

            let fitted = resample_onto(&deformed, &ground_truth).map_err(geometry_error(stage))?;
            let field = displacement_field(&fitted, &reference.subdivided).map_err(geometry_error(stage))?;

            let fitted_path = self.layout.fitting_mesh(frame);
            if let Some(dir) = fitted_path.parent() {
                create_dir(stage, dir)?;
            }
            write_obj(&fitted_path, &fitted).map_err(io_error(stage, &fitted_path))?;
            let raw_path = self.layout.raw_displacements(frame);
            write_displacements(&raw_path, &field).map_err(io_error(stage, &raw_path))?;
            let points_path = self.layout.displacement_points(frame);
            write_ply_points(&points_path, field.vectors()).map_err(io_error(stage, &points_path))?;
            debug!("frame {frame:03}: {} displacements", field.len());

            frames.push(FrameDisplacement {
                frame,
                ground_truth,
                field,
            });
        }
        Ok(frames)
    }

    pub fn encode_reference(&self) -> PipelineResult<CodecAsset> {
        let stage = Stage::EncodeReference;
        self.enter(stage);
        let settings = self.config.codec_settings().reference;
        let asset = self
            .codec
            .encode(
                AssetKind::ReferenceMesh,
                None,
                &self.layout.decimated_reference(),
                &self.layout.encoded_reference(),
                &settings,
            )
            .map_err(codec_error(stage))?;
        info!("reference mesh: {} bytes", asset.size);
        Ok(asset)
    }

    pub fn encode_displacements(&self) -> PipelineResult<Vec<CodecAsset>> {
        let stage = Stage::EncodeDisplacements;
        self.enter(stage);
        create_dir(stage, &self.layout.group_dir())?;
        let settings = self.config.codec_settings().displacement;
        self.config
            .frame_indices()
            .map(|frame| {
                self.codec
                    .encode(
                        AssetKind::DisplacementField,
                        Some(frame),
                        &self.layout.displacement_points(frame),
                        &self.layout.encoded_displacement(frame),
                        &settings,
                    )
                    .map_err(codec_error(stage))
            })
            .collect()
    }

    /// Decodes the reference and resolves its correspondence with the
    /// original subdivided reference once for the whole group.
    pub fn decode_reference(
        &self,
        reference: &ReferenceTopology,
        asset: &CodecAsset,
    ) -> PipelineResult<DecodedReference> {
        let stage = Stage::DecodeReference;
        self.enter(stage);
        let decoded = self
            .codec
            .decode(asset, &self.layout.decoded_reference())
            .map_err(codec_error(stage))?;
        let mesh = read_obj(&decoded.path).map_err(io_error(stage, &decoded.path))?;
        let start = Instant::now();
        let mesh = subdivided(&mesh, tvmc_core::resample::SUBDIVISION_LEVEL);
        let subdivision_ms = elapsed_ms(start);
        let reconstructor = Reconstructor::new(&reference.subdivided, mesh).map_err(geometry_error(stage))?;
        Ok(DecodedReference {
            asset: decoded,
            reconstructor,
            subdivision_ms,
        })
    }

    pub fn decode_displacements(&self, assets: &[CodecAsset]) -> PipelineResult<Vec<DecodedFrame>> {
        let stage = Stage::DecodeDisplacements;
        self.enter(stage);
        let mut frames = Vec::with_capacity(assets.len());
        for asset in assets {
            let frame = asset.frame.ok_or_else(|| PipelineError::UntaggedAsset {
                stage,
                path: asset.path.clone(),
            })?;
            let decoded = self
                .codec
                .decode(asset, &self.layout.decoded_displacement(frame))
                .map_err(codec_error(stage))?;
            let displacements = read_ply_points(&decoded.path).map_err(io_error(stage, &decoded.path))?;
            frames.push(DecodedFrame {
                asset: decoded,
                frame,
                displacements,
            });
        }
        Ok(frames)
    }

    pub fn reconstruct(
        &self,
        reference: &DecodedReference,
        frames: &[FrameDisplacement],
        decoded: &[DecodedFrame],
    ) -> PipelineResult<Vec<ReconstructedFrame>> {
        let stage = Stage::ReconstructPerFrame;
        self.enter(stage);
        if frames.len() != decoded.len() {
            return Err(geometry_error(stage)(TvmcError::LengthMismatch {
                what: "decoded displacement assets",
                expected: frames.len(),
                actual: decoded.len(),
            }));
        }
        create_dir(stage, self.layout.reconstruction_dir())?;
        let mut out = Vec::with_capacity(frames.len());
        for (original, decoded) in frames.iter().zip(decoded) {
            let start = Instant::now();
            let mesh = reference
                .reconstructor
                .reconstruct(&original.field, &decoded.displacements)
                .map_err(geometry_error(stage))?;
            let realign_ms = elapsed_ms(start);
            let path = self.layout.reconstructed(original.frame);
            write_obj(&path, &mesh).map_err(io_error(stage, &path))?;
            info!("mesh 0{:03} saved to {}", original.frame, path.display());
            out.push(ReconstructedFrame {
                frame: original.frame,
                path,
                mesh,
                realign_ms,
            });
        }
        Ok(out)
    }

    pub fn evaluate(
        &self,
        frames: &[FrameDisplacement],
        reconstructed: &[ReconstructedFrame],
    ) -> PipelineResult<Vec<FrameReport>> {
        let stage = Stage::Evaluate;
        self.enter(stage);
        frames
            .iter()
            .zip(reconstructed)
            .map(|(frame, recon)| {
                let evaluator =
                    DistortionEvaluator::new(&frame.ground_truth, &recon.mesh).map_err(geometry_error(stage))?;
                let sample = evaluator.sample().map_err(geometry_error(stage))?;
                let report = FrameReport::new(frame.frame, sample);
                info!(
                    "frame 0{:03}: D1 {:.4} D2 {:.4} log10 mse {:.4} log10 rmse {:.4} hausdorff {:.4}",
                    report.frame, report.d1_psnr, report.d2_psnr, report.log_mse, report.log_rmse, report.hausdorff
                );
                Ok(report)
            })
            .collect()
    }

    pub fn report(
        &self,
        encoded: &EncodedAssets,
        decoded_reference: &DecodedReference,
        decoded: &[DecodedFrame],
        reconstructed: &[ReconstructedFrame],
        frames: Vec<FrameReport>,
    ) -> PipelineResult<RunSummary> {
        let stage = Stage::Report;
        self.enter(stage);
        let bitrate = BitrateReport::from_assets(&encoded.all(), self.config.duration_s())
            .map_err(|source| PipelineError::Rate { stage, source })?;
        let timing = TimingReport::new(encoded, decoded_reference, decoded, reconstructed);
        let samples: Vec<DistortionSample> = frames.iter().map(FrameReport::sample).collect();
        let means = DistortionSummary::from_samples(&samples);

        info!("total size of {} assets: {} bytes", encoded.displacements.len() + 1, bitrate.total_bytes());
        info!("overall bitrate: {:.2} Kbps", bitrate.total_bps / 1e3);
        info!("reference bitrate: {:.2} Mbps", bitrate.reference_mbps());
        info!("displacements bitrate: {:.2} Mbps", bitrate.displacement_mbps());
        info!("overall bitrate: {:.2} Mbps", bitrate.total_mbps());
        if let Some(ms) = timing.mean_encode_ms {
            info!("mean encoding time: {ms:.6} ms");
        }
        if let Some(ms) = timing.mean_decode_ms {
            info!("mean decoding time: {ms:.6} ms");
        }
        info!("decoding time: {:.3} ms", timing.decode_time_ms);
        if let Some(m) = &means {
            info!("average D1: {}", m.d1_psnr);
            info!("average D2: {}", m.d2_psnr);
            info!("average log10 of mse: {}", m.log_mse);
            info!("average log10 of rmse: {}", m.log_rmse);
        }

        Ok(RunSummary {
            dataset: self.config.dataset.clone(),
            qp: self.config.qp,
            num_frames: self.config.num_frames,
            bitrate,
            timing,
            frames,
            d1_mean: means.map(|m| m.d1_psnr),
            d2_mean: means.map(|m| m.d2_psnr),
            log_mse_mean: means.map(|m| m.log_mse),
            log_rmse_mean: means.map(|m| m.log_rmse),
            hausdorff_mean: means.map(|m| m.hausdorff),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::CopyCodec;
    use crate::config::test_config;
    use tempfile::tempdir;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            [
                "LOAD_REFERENCE",
                "BUILD_DISPLACEMENTS",
                "ENCODE_REFERENCE",
                "ENCODE_DISPLACEMENTS",
                "DECODE_REFERENCE",
                "DECODE_DISPLACEMENTS",
                "RECONSTRUCT_PER_FRAME",
                "EVALUATE",
                "REPORT",
            ]
        );
        assert_eq!(Stage::Evaluate.to_string(), "EVALUATE");
    }

    #[test]
    fn test_invalid_config_rejected_before_any_stage() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.last_index = 0;
        let err = Pipeline::new(&config, CopyCodec::default()).err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_missing_reference_fails_first_stage() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let pipeline = Pipeline::new(&config, CopyCodec::default()).unwrap();
        let err = pipeline.run().unwrap_err();
        assert_eq!(err.stage(), Some(Stage::LoadReference));
        match err {
            PipelineError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_untagged_displacement_asset_rejected() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        let codec = CopyCodec::default();
        let pipeline = Pipeline::new(&config, &codec).unwrap();
        let asset = CodecAsset {
            kind: AssetKind::DisplacementField,
            frame: None,
            qp: config.qp,
            path: dir.path().join("displacements.drc"),
            size: 0,
            encode_ms: None,
        };
        let err = pipeline.decode_displacements(&[asset]).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::DecodeDisplacements));
        assert!(matches!(err, PipelineError::UntaggedAsset { .. }));
        assert!(codec.calls.borrow().is_empty());
    }

    #[test]
    fn test_summary_line_nulls_non_finite() {
        let line = SummaryLine {
            bitrate_mbps: 1.5,
            d2s_mean: f64::INFINITY,
        };
        assert_eq!(line.to_json().unwrap(), r#"{"bitrate_mbps":1.5,"d2s_mean":null}"#);
    }
}
