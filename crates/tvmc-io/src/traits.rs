//! Common traits for readers and writers.
//!
//! Import the trait to access its methods:
//!
//! ```ignore
//! use tvmc_io::{Writer, ObjWriter};
//!
//! let mut writer = ObjWriter::new();
//! writer.add_mesh(&mesh, Some("Name"))?;
//! writer.write("output.obj")?;
//! ```

use std::io;
use std::path::Path;

use tvmc_core::{Mesh, Vector3d};

/// Common interface for mesh writers.
pub trait Writer: Sized {
    /// Create a new writer instance.
    fn new() -> Self;

    /// Add a mesh to be written. Formats without naming ignore `name`.
    fn add_mesh(&mut self, mesh: &Mesh, name: Option<&str>) -> io::Result<()>;

    /// Write everything added so far to `path`.
    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()>;

    /// Number of vertices added.
    fn vertex_count(&self) -> usize;

    /// Number of faces added (if applicable).
    fn face_count(&self) -> usize {
        0
    }
}

/// Common interface for mesh readers.
pub trait Reader: Sized {
    /// Open a file for reading. A missing file is `NotFound`.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;

    /// Read every mesh in the file.
    fn read_meshes(&mut self) -> io::Result<Vec<Mesh>>;

    /// Read a single mesh; the default returns the first of `read_meshes()`.
    fn read_mesh(&mut self) -> io::Result<Mesh> {
        let meshes = self.read_meshes()?;
        if let Some(m) = meshes.into_iter().next() {
            Ok(m)
        } else {
            Err(io::Error::new(io::ErrorKind::InvalidData, "No mesh found"))
        }
    }
}

/// Writers that can output point clouds (no faces).
pub trait PointCloudWriter: Writer {
    /// Add raw point positions.
    fn add_points(&mut self, points: &[Vector3d]);

    /// Add a single point.
    fn add_point(&mut self, point: Vector3d) {
        self.add_points(&[point]);
    }
}

/// Readers that can return bare point positions.
pub trait PointCloudReader: Reader {
    /// Read point positions only (no faces or topology).
    fn read_points(&mut self) -> io::Result<Vec<Vector3d>>;
}
