//! Exact nearest-neighbour search over a static 3D point set.
//!
//! Backed by an immutable `kiddo` kd-tree over the distinct positions.
//! Repeated positions collapse onto their first occurrence before the tree
//! is built.
//!
//! Ties at equal squared distance resolve to the smallest point index, so
//! the answer depends on the input order alone and never on how the tree
//! happened to split.

use std::collections::HashSet;
use std::fmt;

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use rayon::prelude::*;

use crate::status::{Status, TvmcError};
use crate::vector::{distance_squared, Vector3d};

/// Bucket size of the kd-tree leaves.
const BUCKET_SIZE: usize = 32;

type Tree = ImmutableKdTree<f64, u64, 3, BUCKET_SIZE>;

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the match in the point set the index was built from.
    pub index: usize,
    pub distance_squared: f64,
}

impl Neighbor {
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }

    #[inline]
    fn is_better_than(&self, other: &Neighbor) -> bool {
        self.distance_squared < other.distance_squared
            || (self.distance_squared == other.distance_squared && self.index < other.index)
    }
}

/// Read-only kd-tree over a copy of the input points.
pub struct SpatialIndex {
    points: Vec<Vector3d>,
    /// Smallest input index of each distinct position, by tree item.
    first_index: Vec<usize>,
    tree: Option<Tree>,
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("points", &self.points.len())
            .field("distinct", &self.first_index.len())
            .finish()
    }
}

impl SpatialIndex {
    /// Builds the index. The point order given here defines the indices
    /// returned by queries.
    pub fn build(points: &[Vector3d]) -> Self {
        let mut seen = HashSet::with_capacity(points.len());
        let mut distinct = Vec::with_capacity(points.len());
        let mut first_index = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            if seen.insert([p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]) {
                distinct.push(p.to_array());
                first_index.push(i);
            }
        }
        let tree = (!distinct.is_empty()).then(|| Tree::new_from_slice(&distinct));
        Self {
            points: points.to_vec(),
            first_index,
            tree,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Vector3d {
        self.points[index]
    }

    pub fn points(&self) -> &[Vector3d] {
        &self.points
    }

    fn neighbor(&self, item: u64, query: Vector3d) -> Neighbor {
        let index = self.first_index[item as usize];
        Neighbor {
            index,
            distance_squared: distance_squared(self.points[index], query),
        }
    }

    /// Exact nearest neighbour of `query`, `None` on an empty index.
    pub fn try_nearest(&self, query: Vector3d) -> Option<Neighbor> {
        let tree = self.tree.as_ref()?;
        let q = query.to_array();
        let hit = tree.nearest_one::<SquaredEuclidean>(&q);
        let mut best = self.neighbor(hit.item, query);

        // Sweep every point at the same distance, with a few ulps of slack
        // for the tree's own distance arithmetic.
        let radius = hit.distance * (1.0 + 8.0 * f64::EPSILON) + f64::MIN_POSITIVE;
        for candidate in tree.within_unsorted::<SquaredEuclidean>(&q, radius) {
            let candidate = self.neighbor(candidate.item, query);
            if candidate.is_better_than(&best) {
                best = candidate;
            }
        }
        Some(best)
    }

    /// Exact nearest neighbour of `query`.
    ///
    /// Querying an empty index is a precondition violation.
    pub fn nearest(&self, query: Vector3d) -> Status<Neighbor> {
        self.try_nearest(query)
            .ok_or(TvmcError::EmptyPointSet("nearest-neighbour query on an empty index"))
    }

    /// Nearest neighbour of every query, in query order. Queries run in
    /// parallel; the result is identical to calling [`Self::nearest`] in a loop.
    pub fn nearest_all(&self, queries: &[Vector3d]) -> Status<Vec<Neighbor>> {
        if self.is_empty() {
            return Err(TvmcError::EmptyPointSet("nearest-neighbour query on an empty index"));
        }
        queries.par_iter().map(|&q| self.nearest(q)).collect()
    }
}
