//! TVMC I/O library for the file formats an evaluation run reads and writes.
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Used for |
//! |--------|------|-------|----------|
//! | OBJ    | ✓    | ✓     | frame meshes, reference meshes, reconstructions |
//! | PLY    | ✓    | ✓     | displacement point clouds around the codec (ASCII write, ASCII or binary read) |
//! | text matrix | ✓ | ✓   | raw displacement fields, distance matrices, index lists |
//! | XYZ / BIN centers | ✓ | ✓ | volume centers |
//! | dual quaternion lists | ✓ | ✓ | per-center transforms |
//!
//! # Unified Trait API
//!
//! Mesh formats implement [`Reader`] and [`Writer`]:
//!
//! ```ignore
//! use tvmc_io::{Reader, Writer, ObjReader, ObjWriter};
//!
//! fn load<R: Reader>(path: &str) -> io::Result<Mesh> {
//!     let mut reader = R::open(path)?;
//!     reader.read_mesh()
//! }
//!
//! let mesh = load::<ObjReader>("frame_001.obj")?;
//! let mut writer = ObjWriter::new();
//! writer.add_mesh(&mesh, None)?;
//! writer.write("copy.obj")?;
//! ```
//!
//! Malformed input is reported as `io::ErrorKind::InvalidData`, a missing
//! file as `io::ErrorKind::NotFound`. Nothing is repaired on load.

pub mod centers_io;
pub mod obj_reader;
pub mod obj_writer;
pub mod ply_reader;
pub mod ply_writer;
pub mod text_matrix;
pub mod traits;
pub mod transforms_io;

pub use centers_io::{list_center_files, read_centers, read_center_frames, write_centers_bin, write_centers_xyz};
pub use obj_reader::{read_obj, ObjReader};
pub use obj_writer::{write_obj, ObjWriter};
pub use ply_reader::{read_ply_points, PlyReader};
pub use ply_writer::{write_ply_points, PlyWriter};
pub use text_matrix::{
    read_displacements, read_indices, read_matrix, read_vectors, write_displacements, write_distance_matrix,
    write_indices, write_vectors,
};
pub use traits::{PointCloudReader, PointCloudWriter, Reader, Writer};
pub use transforms_io::{read_indexed_transforms, read_transforms, write_center_transforms, write_transforms};

use std::io;
use std::path::Path;

use tvmc_core::TvmcError;

pub(crate) fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

pub(crate) fn from_status(err: TvmcError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

pub(crate) fn check_exists(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        ));
    }
    Ok(())
}
