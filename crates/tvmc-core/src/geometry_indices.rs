/// Position of a vertex in a mesh's vertex buffer.
///
/// Stored as `u32` to match the index width of the codec's mesh format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIndex(pub u32);

impl VertexIndex {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for VertexIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

impl From<VertexIndex> for u32 {
    fn from(v: VertexIndex) -> Self {
        v.0
    }
}

impl From<usize> for VertexIndex {
    fn from(v: usize) -> Self {
        Self(v as u32)
    }
}
