use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TvmcError {
    #[error("Face {face} references vertex {index} but the mesh has {num_vertices} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        num_vertices: usize,
    },
    #[error("Degenerate triangle {0}: repeated vertex index")]
    DegenerateTriangle(usize),
    #[error("Attribute shape mismatch: {0}")]
    AttributeMismatch(String),
    #[error("Length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Empty point set: {0}")]
    EmptyPointSet(&'static str),
    #[error("No plane normals for {0}: no faces and no stored normals")]
    MissingNormals(&'static str),
}

pub type Status<T = ()> = Result<T, TvmcError>;

pub fn ok_status() -> Status {
    Ok(())
}
