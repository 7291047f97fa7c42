//! Volume-center commands: per-frame transforms toward the aligned
//! reference centers, and the max pairwise-distance matrix fed to the
//! external scaling step.

use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;
use tvmc_core::{center_transforms, max_distance_matrix, TvmcError};
use tvmc_io::centers_io::{list_center_files, read_center_frames, read_centers};
use tvmc_io::text_matrix::write_distance_matrix;
use tvmc_io::transforms_io::write_center_transforms;

use crate::layout::DatasetLayout;

#[derive(Error, Debug)]
pub enum CentersError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Geometry(#[from] TvmcError),
    #[error("no center files in {0}")]
    NoCenterFiles(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CentersError + '_ {
    move |source| CentersError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `indices_`, `transformations_` and `inverse_transformations_`
/// files for the first `num_frames` center files, numbered from
/// `first_index`. Returns the number of frames written.
pub fn write_frame_transforms(
    layout: &DatasetLayout,
    num_frames: usize,
    first_index: usize,
) -> Result<usize, CentersError> {
    let reference_path = layout.reference_centers();
    let reference = read_centers(&reference_path).map_err(io_error(&reference_path))?;
    let centers_dir = layout.centers_dir();
    let files = list_center_files(&centers_dir).map_err(io_error(&centers_dir))?;
    if files.is_empty() {
        return Err(CentersError::NoCenterFiles(centers_dir));
    }
    if files.len() < num_frames {
        warn!("{} center files for {} frames", files.len(), num_frames);
    }
    let mut written = 0;
    for (frame, file) in (first_index..).zip(files.iter().take(num_frames)) {
        let centers = read_centers(file).map_err(io_error(file))?;
        let transforms = center_transforms(&centers, &reference)?;
        let indices = layout.indices(frame);
        write_center_transforms(
            &transforms,
            &indices,
            &layout.transformations(frame),
            &layout.inverse_transformations(frame),
        )
        .map_err(io_error(&indices))?;
        info!(
            "frame {frame:03}: {} of {} centers moved ({})",
            transforms.moved.len(),
            centers.len(),
            file.display()
        );
        written += 1;
    }
    Ok(written)
}

/// Computes the max pairwise-distance matrix over the first `num_frames`
/// center files and writes it next to them.
pub fn write_max_distance_matrix(
    layout: &DatasetLayout,
    num_frames: usize,
    num_centers: usize,
) -> Result<PathBuf, CentersError> {
    let centers_dir = layout.centers_dir();
    let frames = read_center_frames(&centers_dir, Some(num_frames)).map_err(io_error(&centers_dir))?;
    if frames.is_empty() {
        return Err(CentersError::NoCenterFiles(centers_dir));
    }
    let matrix = max_distance_matrix(&frames)?;
    if matrix.size() != num_centers {
        warn!("center files hold {} centers, expected {}", matrix.size(), num_centers);
    }
    let path = layout.distance_matrix(num_frames, num_centers);
    write_distance_matrix(&path, &matrix).map_err(io_error(&path))?;
    info!(
        "distance matrix over {} frames and {} centers written to {}",
        frames.len(),
        matrix.size(),
        path.display()
    );
    Ok(path)
}
