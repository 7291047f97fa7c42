//! Codec orchestration.
//!
//! The codec is a black box behind the [`Codec`] trait. [`ExternalCodec`]
//! drives the encoder and decoder binaries with their fixed argument
//! contract; tests inject an in-process implementation instead.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

pub const ENCODE_MARKER: &str = "ms to encode";
pub const DECODE_MARKER: &str = "ms to decode";

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: PathBuf,
        status: String,
        stderr: String,
    },
    #[error("codec produced no output at {0}")]
    MissingOutput(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Encoder knobs for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EncodeSettings {
    pub qp: u32,
    pub compression_level: u32,
    pub point_cloud: bool,
}

impl EncodeSettings {
    /// High-fidelity setting for the reference mesh, independent of the sweep.
    pub const REFERENCE_MESH: Self = Self {
        qp: 14,
        compression_level: 7,
        point_cloud: false,
    };

    pub fn displacement(qp: u32) -> Self {
        Self {
            qp,
            compression_level: 10,
            point_cloud: true,
        }
    }
}

/// Outcome of one codec invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecRun {
    /// Time the codec reported for itself, when it did.
    pub elapsed_ms: Option<u64>,
    pub stdout: String,
    pub stderr: String,
}

pub trait Codec {
    fn encode(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> Result<CodecRun, CodecError>;
    fn decode(&self, input: &Path, output: &Path) -> Result<CodecRun, CodecError>;
}

impl<C: Codec + ?Sized> Codec for &C {
    fn encode(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> Result<CodecRun, CodecError> {
        (**self).encode(input, output, settings)
    }

    fn decode(&self, input: &Path, output: &Path) -> Result<CodecRun, CodecError> {
        (**self).decode(input, output)
    }
}

/// Encoder command line: `[-point_cloud] -i IN -o OUT -qp N -cl N`.
pub fn encode_args(input: &Path, output: &Path, settings: &EncodeSettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::with_capacity(9);
    if settings.point_cloud {
        args.push("-point_cloud".into());
    }
    args.push("-i".into());
    args.push(input.into());
    args.push("-o".into());
    args.push(output.into());
    args.push("-qp".into());
    args.push(settings.qp.to_string().into());
    args.push("-cl".into());
    args.push(settings.compression_level.to_string().into());
    args
}

/// Decoder command line: `-i IN -o OUT`.
pub fn decode_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec!["-i".into(), input.into(), "-o".into(), output.into()]
}

/// Finds the first decimal integer immediately followed by `" " + marker`.
///
/// ```
/// use tvmc_tools::codec::{parse_elapsed_ms, ENCODE_MARKER};
///
/// assert_eq!(parse_elapsed_ms("Encoded in 42 ms to encode.", ENCODE_MARKER), Some(42));
/// assert_eq!(parse_elapsed_ms("no timing here", ENCODE_MARKER), None);
/// ```
pub fn parse_elapsed_ms(text: &str, marker: &str) -> Option<u64> {
    let needle = format!(" {marker}");
    text.match_indices(&needle).find_map(|(pos, _)| {
        let head = &text[..pos];
        let digits = head.len() - head.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        head[pos - digits..].parse().ok()
    })
}

/// Codec implemented by external encoder and decoder executables.
#[derive(Debug, Clone)]
pub struct ExternalCodec {
    encoder: PathBuf,
    decoder: PathBuf,
}

impl ExternalCodec {
    pub fn new(encoder: impl Into<PathBuf>, decoder: impl Into<PathBuf>) -> Self {
        Self {
            encoder: encoder.into(),
            decoder: decoder.into(),
        }
    }

    fn run(&self, program: &Path, args: Vec<OsString>, marker: &str) -> Result<CodecRun, CodecError> {
        debug!("running {} {:?}", program.display(), args);
        // Blocking call without a timeout: a hung codec stalls the run.
        let output = Command::new(program)
            .args(&args)
            .output()
            .map_err(|source| CodecError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(CodecError::Exit {
                program: program.to_path_buf(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stdout.trim().is_empty() {
            debug!("{}: {}", program.display(), stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("{} (stderr): {}", program.display(), stderr.trim());
        }
        Ok(CodecRun {
            elapsed_ms: parse_elapsed_ms(&stdout, marker),
            stdout,
            stderr,
        })
    }
}

impl Codec for ExternalCodec {
    fn encode(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> Result<CodecRun, CodecError> {
        self.run(&self.encoder, encode_args(input, output, settings), ENCODE_MARKER)
    }

    fn decode(&self, input: &Path, output: &Path) -> Result<CodecRun, CodecError> {
        self.run(&self.decoder, decode_args(input, output), DECODE_MARKER)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    ReferenceMesh,
    DisplacementField,
}

/// An encoded buffer on disk. Never modified after encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecAsset {
    pub kind: AssetKind,
    /// Frame index; `None` for the reference mesh.
    pub frame: Option<usize>,
    pub qp: u32,
    pub path: PathBuf,
    pub size: u64,
    pub encode_ms: Option<u64>,
}

/// A decoded asset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
    pub kind: AssetKind,
    pub frame: Option<usize>,
    pub path: PathBuf,
    pub decode_ms: Option<u64>,
}

fn require_output(path: &Path) -> Result<u64, CodecError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CodecError::MissingOutput(path.to_path_buf())),
        Err(source) => Err(CodecError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Encodes and decodes assets through a [`Codec`], recording size and timing.
#[derive(Debug, Clone)]
pub struct CodecOrchestrator<C> {
    codec: C,
}

impl<C: Codec> CodecOrchestrator<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn encode(
        &self,
        kind: AssetKind,
        frame: Option<usize>,
        input: &Path,
        output: &Path,
        settings: &EncodeSettings,
    ) -> Result<CodecAsset, CodecError> {
        let run = self.codec.encode(input, output, settings)?;
        let size = require_output(output)?;
        if run.elapsed_ms.is_none() {
            warn!("no encode timing reported for {}", output.display());
        }
        debug!("encoded {} ({} bytes, qp {})", output.display(), size, settings.qp);
        Ok(CodecAsset {
            kind,
            frame,
            qp: settings.qp,
            path: output.to_path_buf(),
            size,
            encode_ms: run.elapsed_ms,
        })
    }

    pub fn decode(&self, asset: &CodecAsset, output: &Path) -> Result<DecodedAsset, CodecError> {
        let run = self.codec.decode(&asset.path, output)?;
        require_output(output)?;
        if run.elapsed_ms.is_none() {
            warn!("no decode timing reported for {}", asset.path.display());
        }
        debug!("decoded {} -> {}", asset.path.display(), output.display());
        Ok(DecodedAsset {
            kind: asset.kind,
            frame: asset.frame,
            path: output.to_path_buf(),
            decode_ms: run.elapsed_ms,
        })
    }
}
