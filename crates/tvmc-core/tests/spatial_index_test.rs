use proptest::prelude::*;
use tvmc_core::vector::distance_squared;
use tvmc_core::{SpatialIndex, Vector3d};

fn brute_force(points: &[Vector3d], q: Vector3d) -> (usize, f64) {
    let mut best = (usize::MAX, f64::INFINITY);
    for (i, p) in points.iter().enumerate() {
        let d = distance_squared(*p, q);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn point() -> impl Strategy<Value = Vector3d> {
    // Coarse lattice so ties and duplicates show up often.
    (-8i32..8, -8i32..8, -8i32..8)
        .prop_map(|(x, y, z)| Vector3d::new(x as f64 * 0.5, y as f64 * 0.5, z as f64 * 0.5))
}

proptest! {
    #[test]
    fn nearest_matches_brute_force(
        points in prop::collection::vec(point(), 1..300),
        queries in prop::collection::vec(point(), 1..50),
    ) {
        let index = SpatialIndex::build(&points);
        for q in queries {
            let n = index.nearest(q).unwrap();
            let (i, d) = brute_force(&points, q);
            prop_assert_eq!(n.distance_squared, d);
            // Strict `<` in the brute force keeps the first, i.e. smallest, index.
            prop_assert_eq!(n.index, i);
        }
    }

    #[test]
    fn batch_query_matches_single(
        points in prop::collection::vec(point(), 1..200),
        queries in prop::collection::vec(point(), 1..100),
    ) {
        let index = SpatialIndex::build(&points);
        let batch = index.nearest_all(&queries).unwrap();
        for (q, n) in queries.iter().zip(batch) {
            prop_assert_eq!(n, index.nearest(*q).unwrap());
        }
    }
}

#[test]
fn test_large_cloud_exact() {
    let mut points = Vec::new();
    for i in 0..20_000u32 {
        let t = i as f64;
        points.push(Vector3d::new((t * 0.37).sin(), (t * 0.11).cos(), (t * 0.05).sin() * 2.0));
    }
    let index = SpatialIndex::build(&points);
    for (i, p) in points.iter().enumerate().step_by(997) {
        let n = index.nearest(*p).unwrap();
        assert_eq!(n.distance_squared, 0.0);
        assert!(n.index <= i);
    }
}
