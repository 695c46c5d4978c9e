//! Neighbor search. Particles farther apart than h contribute nothing, so restricting each
//! particle's scan to nearby cells changes cost, not results.

use std::collections::HashMap;

use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::params::NeighborSearch;

type CellKey = (i64, i64, i64);

/// Float-to-int casts saturate, so a far-off position lands in an edge cell. Saturation
/// keeps neighboring cells adjacent, and the distance filter discards false candidates.
fn cell_of(posit: Vec3, cell_size: f64) -> CellKey {
    (
        (posit.x / cell_size).floor() as i64,
        (posit.y / cell_size).floor() as i64,
        (posit.z / cell_size).floor() as i64,
    )
}

/// Uniform grid keyed by `floor(position / h)`. Rebuilt each step.
#[derive(Debug, Default)]
pub struct UniformGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl UniformGrid {
    pub fn new(posits: &[Vec3], cell_size: f64) -> Self {
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (i, posit) in posits.iter().enumerate() {
            cells.entry(cell_of(*posit, cell_size)).or_default().push(i);
        }

        Self { cell_size, cells }
    }

    /// Call `f` on every particle index in the 3x3x3 block of cells around `posit`.
    pub fn for_each_candidate<F: FnMut(usize)>(&self, posit: Vec3, mut f: F) {
        let (cx, cy, cz) = cell_of(posit, self.cell_size);

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    // Past the representable range there are no cells to visit.
                    let (Some(x), Some(y), Some(z)) =
                        (cx.checked_add(dx), cy.checked_add(dy), cz.checked_add(dz))
                    else {
                        continue;
                    };
                    if let Some(indices) = self.cells.get(&(x, y, z)) {
                        for &j in indices {
                            f(j);
                        }
                    }
                }
            }
        }
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }
}

/// For every particle, the indices of the *other* particles strictly within h, in ascending order.
#[derive(Clone, Debug, Default)]
pub struct NeighborLists {
    pub lists: Vec<Vec<usize>>,
}

impl NeighborLists {
    pub fn build(posits: &[Vec3], h: f64, mode: NeighborSearch) -> Self {
        let h_sq = h * h;

        let lists = match mode {
            NeighborSearch::AllPairs => posits
                .par_iter()
                .enumerate()
                .map(|(i, posit)| {
                    posits
                        .iter()
                        .enumerate()
                        .filter(|(j, other)| {
                            *j != i && (**other - *posit).magnitude_squared() < h_sq
                        })
                        .map(|(j, _)| j)
                        .collect()
                })
                .collect(),
            NeighborSearch::Grid => {
                let grid = UniformGrid::new(posits, h);

                posits
                    .par_iter()
                    .enumerate()
                    .map(|(i, posit)| {
                        let mut result = Vec::new();
                        grid.for_each_candidate(*posit, |j| {
                            if j != i && (posits[j] - *posit).magnitude_squared() < h_sq {
                                result.push(j);
                            }
                        });
                        // Cell visitation order is arbitrary; sort so both modes sum in the same order.
                        result.sort_unstable();
                        result
                    })
                    .collect()
            }
        };

        Self { lists }
    }

    pub fn of(&self, i: usize) -> &[usize] {
        &self.lists[i]
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Mean neighbor count; useful for tuning h.
    pub fn mean_count(&self) -> f64 {
        if self.lists.is_empty() {
            return 0.;
        }
        let total: usize = self.lists.iter().map(Vec::len).sum();
        total as f64 / self.lists.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn excludes_self_and_far_particles() {
        let posits = vec![
            Vec3::new(0., 0., 0.),
            Vec3::new(0.05, 0., 0.),
            Vec3::new(0.5, 0., 0.),
        ];

        for mode in [NeighborSearch::AllPairs, NeighborSearch::Grid] {
            let n = NeighborLists::build(&posits, 0.1, mode);
            assert_eq!(n.of(0), &[1]);
            assert_eq!(n.of(1), &[0]);
            assert!(n.of(2).is_empty());
        }
    }

    #[test]
    fn exactly_h_apart_are_not_neighbors() {
        let posits = vec![Vec3::new(0., 0., 0.), Vec3::new(1., 0., 0.)];

        for mode in [NeighborSearch::AllPairs, NeighborSearch::Grid] {
            let n = NeighborLists::build(&posits, 1., mode);
            assert!(n.of(0).is_empty());
            assert!(n.of(1).is_empty());
        }
    }

    #[test]
    fn grid_matches_all_pairs() {
        let mut rng = StdRng::seed_from_u64(7);
        let posits: Vec<Vec3> = (0..400)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                )
            })
            .collect();

        let brute = NeighborLists::build(&posits, 0.2, NeighborSearch::AllPairs);
        let grid = NeighborLists::build(&posits, 0.2, NeighborSearch::Grid);

        assert_eq!(brute.lists, grid.lists);
        assert!(brute.mean_count() > 0.);
    }

    #[test]
    fn grid_buckets_negative_coords() {
        let posits = vec![Vec3::new(-0.05, -0.05, -0.05), Vec3::new(0.05, 0.05, 0.05)];
        let grid = UniformGrid::new(&posits, 0.1);
        assert_eq!(grid.num_cells(), 2);

        let mut found = Vec::new();
        grid.for_each_candidate(posits[0], |j| found.push(j));
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn grid_handles_cells_beyond_i64_range() {
        // x / h is far past i64::MAX for all but the particle at the origin.
        let posits = vec![
            Vec3::new(0.5, 0., 0.),
            Vec3::new(0., 0., 0.),
            Vec3::new(-0.5, 0., 0.),
            Vec3::new(0.5, 0., 1e-21),
        ];
        let h = 1e-20;

        let grid = NeighborLists::build(&posits, h, NeighborSearch::Grid);
        let brute = NeighborLists::build(&posits, h, NeighborSearch::AllPairs);
        assert_eq!(grid.lists, brute.lists);
        assert_eq!(grid.of(0), &[3]);
        assert!(grid.of(1).is_empty());
        assert!(grid.of(2).is_empty());

        let far = vec![Vec3::new(1e30, 0., 0.), Vec3::new(-1e30, 0., 0.), Vec3::new(0., 0., 0.)];
        let grid = NeighborLists::build(&far, 0.1, NeighborSearch::Grid);
        assert!(grid.lists.iter().all(Vec::is_empty));
    }
}
