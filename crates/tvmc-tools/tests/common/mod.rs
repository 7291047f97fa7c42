#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tvmc_core::{subdivided, Mesh, Vector3d};
use tvmc_io::write_obj;
use tvmc_tools::{Codec, CodecError, CodecRun, EncodeSettings, RunConfig};

pub fn cube() -> Mesh {
    let positions = vec![
        Vector3d::new(0.0, 0.0, 0.0),
        Vector3d::new(1.0, 0.0, 0.0),
        Vector3d::new(1.0, 1.0, 0.0),
        Vector3d::new(0.0, 1.0, 0.0),
        Vector3d::new(0.0, 0.0, 1.0),
        Vector3d::new(1.0, 0.0, 1.0),
        Vector3d::new(1.0, 1.0, 1.0),
        Vector3d::new(0.0, 1.0, 1.0),
    ];
    let triangles = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    Mesh::from_triangles(positions, &triangles).unwrap()
}

pub fn config(workspace: &Path) -> RunConfig {
    RunConfig {
        dataset: "cube".to_string(),
        num_frames: 1,
        num_centers: 8,
        first_index: 1,
        last_index: 1,
        file_name_prefix: "cube_fr".to_string(),
        encoder_path: PathBuf::from("draco_encoder"),
        decoder_path: PathBuf::from("draco_decoder"),
        qp: 11,
        output_path: workspace.join("reconstructed"),
        workspace: workspace.to_path_buf(),
        frame_rate: 30.0,
    }
}

/// Lays out a dataset where every frame is the cube moved by `[1, 0, 0]`
/// and each deformed reference already follows its frame.
pub fn write_translated_cube_dataset(config: &RunConfig) {
    let layout = config.layout();
    let offset = Vector3d::new(1.0, 0.0, 0.0);
    let reference = cube();
    let moved = reference.translated(offset);

    fs::create_dir_all(layout.decimated_reference().parent().unwrap()).unwrap();
    write_obj(layout.decimated_reference(), &reference).unwrap();
    for frame in config.frame_indices() {
        let truth = layout.frame_mesh(frame);
        fs::create_dir_all(truth.parent().unwrap()).unwrap();
        write_obj(&truth, &subdivided(&moved, 1)).unwrap();
        let deformed = layout.deformed_reference(frame);
        fs::create_dir_all(deformed.parent().unwrap()).unwrap();
        write_obj(&deformed, &moved).unwrap();
    }
}

/// Passes bytes through unchanged.
#[derive(Debug, Default)]
pub struct CopyCodec;

fn copy(input: &Path, output: &Path) -> Result<(), CodecError> {
    fs::copy(input, output)
        .map(|_| ())
        .map_err(|source| CodecError::Io {
            path: input.to_path_buf(),
            source,
        })
}

impl Codec for CopyCodec {
    fn encode(&self, input: &Path, output: &Path, _: &EncodeSettings) -> Result<CodecRun, CodecError> {
        copy(input, output)?;
        Ok(CodecRun {
            elapsed_ms: Some(3),
            ..CodecRun::default()
        })
    }

    fn decode(&self, input: &Path, output: &Path) -> Result<CodecRun, CodecError> {
        copy(input, output)?;
        Ok(CodecRun::default())
    }
}

/// Like [`write_translated_cube_dataset`], but every ground-truth vertex is
/// pushed off the translated cube by a smooth position-dependent offset,
/// so the displacements are no longer all equal.
pub fn write_wavy_cube_dataset(config: &RunConfig) {
    write_translated_cube_dataset(config);
    let layout = config.layout();
    let mut truth = subdivided(&cube().translated(Vector3d::new(1.0, 0.0, 0.0)), 1);
    for p in truth.positions_mut() {
        let offset = Vector3d::new(
            (3.0 * p.x + p.y).sin(),
            (2.0 * p.y + p.z).cos(),
            (5.0 * p.z + p.x).sin(),
        ) * 0.1;
        *p += offset;
    }
    for frame in config.frame_indices() {
        write_obj(layout.frame_mesh(frame), &truth).unwrap();
    }
}

const QUANTIZED_MAGIC: &[u8; 4] = b"QPC1";

/// Uniform scalar quantizer for point clouds: `qp` bits per coordinate over
/// the cloud's coordinate range, bit-packed. Meshes pass through unchanged.
#[derive(Debug, Default)]
pub struct QuantizingCodec;

impl Codec for QuantizingCodec {
    fn encode(&self, input: &Path, output: &Path, settings: &EncodeSettings) -> Result<CodecRun, CodecError> {
        if !settings.point_cloud {
            copy(input, output)?;
            return Ok(CodecRun::default());
        }
        let points = tvmc_io::read_ply_points(input).unwrap();
        let coords: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let lo = coords.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = coords.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let levels = ((1u64 << settings.qp) - 1) as f64;
        let step = if hi > lo { (hi - lo) / levels } else { 1.0 };

        let mut bytes = QUANTIZED_MAGIC.to_vec();
        bytes.extend_from_slice(&(points.len() as u32).to_le_bytes());
        bytes.push(settings.qp as u8);
        bytes.extend_from_slice(&lo.to_le_bytes());
        bytes.extend_from_slice(&step.to_le_bytes());
        let mut bits = BitPacker::default();
        for v in coords {
            bits.push(((v - lo) / step).round() as u64, settings.qp);
        }
        bytes.extend(bits.finish());
        fs::write(output, bytes).unwrap();
        Ok(CodecRun::default())
    }

    fn decode(&self, input: &Path, output: &Path) -> Result<CodecRun, CodecError> {
        let bytes = fs::read(input).unwrap();
        if !bytes.starts_with(QUANTIZED_MAGIC) {
            copy(input, output)?;
            return Ok(CodecRun::default());
        }
        let count = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let qp = u32::from(bytes[8]);
        let lo = f64::from_le_bytes(bytes[9..17].try_into().unwrap());
        let step = f64::from_le_bytes(bytes[17..25].try_into().unwrap());
        let mut bits = BitReader::new(&bytes[25..]);
        let points: Vec<Vector3d> = (0..count)
            .map(|_| {
                let mut next = || lo + bits.read(qp) as f64 * step;
                let (x, y, z) = (next(), next(), next());
                Vector3d::new(x, y, z)
            })
            .collect();
        tvmc_io::write_ply_points(output, &points).unwrap();
        Ok(CodecRun::default())
    }
}

#[derive(Default)]
struct BitPacker {
    bytes: Vec<u8>,
    used: u32,
}

impl BitPacker {
    fn push(&mut self, value: u64, width: u32) {
        for bit in (0..width).rev() {
            if self.used % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> bit) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.used % 8);
            }
            self.used += 1;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read(&mut self, width: u32) -> u64 {
        let mut value = 0;
        for _ in 0..width {
            let bit = (self.bytes[self.pos / 8] >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u64::from(bit);
            self.pos += 1;
        }
        value
    }
}
