//! Creates initial particle distributions.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    error::{Result, SimError},
    params::SimParams,
};

type Generated = (Vec<Vec3>, Vec<Vec3>, Vec<f64>);

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum Layout {
    /// Uniformly distributed in the domain box, at rest. Seeded, so runs are reproducible.
    RandomInBox { seed: u64 },
    /// A planar sheet at spacing h, `cols` particles wide, in the z = 0 plane. Mass is ρ₀h².
    Grid2d { cols: usize },
    /// A cubic lattice filling the box from the floor up.
    Grid3d { spacing: f64 },
    /// Positions and velocities supplied by the caller, e.g. loaded from a file.
    Explicit { posits: Vec<Vec3>, vels: Vec<Vec3> },
}

impl Layout {
    pub fn generate(&self, params: &SimParams) -> Result<Generated> {
        // Layouts size themselves from the box, so it must be sane before we sample in it.
        params.validate()?;
        let n = params.num_particles;

        match self {
            Self::RandomInBox { seed } => Ok(make_random(n, params, *seed)),
            Self::Grid2d { cols } => {
                if *cols == 0 {
                    return Err(SimError::InvalidParam("Grid2d needs at least one column".to_owned()));
                }
                make_grid_2d(n, *cols, params)
            }
            Self::Grid3d { spacing } => make_grid_3d(n, *spacing, params),
            Self::Explicit { posits, vels } => Ok((
                posits.clone(),
                vels.clone(),
                vec![params.particle_mass; posits.len()],
            )),
        }
    }
}

fn make_random(n: usize, params: &SimParams, seed: u64) -> Generated {
    let mut rng = StdRng::seed_from_u64(seed);
    // Keep clear of the walls, so no particle starts on the clamp boundary.
    let b = params.box_size - params.boundary_offset;

    let posits = (0..n)
        .map(|_| {
            Vec3::new(
                rng.random_range(-b..b),
                rng.random_range(-b..b),
                rng.random_range(-b..b),
            )
        })
        .collect();

    (posits, vec![Vec3::new_zero(); n], vec![params.particle_mass; n])
}

const GRID_2D_OFFSET: f64 = -0.5;

fn make_grid_2d(n: usize, cols: usize, params: &SimParams) -> Result<Generated> {
    let h = params.smoothing_len;
    let b = params.box_size;

    let cols_used = cols.min(n);
    let rows = n.div_ceil(cols);
    let x_max = (cols_used - 1) as f64 * h + GRID_2D_OFFSET;
    let y_max = (rows - 1) as f64 * h + GRID_2D_OFFSET;

    if GRID_2D_OFFSET < -b || x_max > b || y_max > b {
        return Err(SimError::InvalidParam(format!(
            "A {cols_used}x{rows} sheet at spacing {h} spans up to ({x_max:.3}, {y_max:.3}), \
             outside a box of half-extent {b}"
        )));
    }

    let posits = (0..n)
        .map(|i| {
            Vec3::new(
                (i % cols) as f64 * h + GRID_2D_OFFSET,
                (i / cols) as f64 * h + GRID_2D_OFFSET,
                0.,
            )
        })
        .collect();

    Ok((posits, vec![Vec3::new_zero(); n], vec![params.mass_2d(); n]))
}

fn make_grid_3d(n: usize, spacing: f64, params: &SimParams) -> Result<Generated> {
    if !spacing.is_finite() || spacing <= 0. {
        return Err(SimError::InvalidParam(format!(
            "Grid3d spacing must be positive; got {spacing}"
        )));
    }

    let per_axis = (2. * params.box_size / spacing).floor() as usize;
    if per_axis.pow(3) < n {
        return Err(SimError::InvalidParam(format!(
            "A box of half-extent {} holds {} particles at spacing {spacing}; {n} requested",
            params.box_size,
            per_axis.pow(3)
        )));
    }

    let start = -params.box_size + spacing / 2.;
    let layer = per_axis * per_axis;

    let posits = (0..n)
        .map(|i| {
            let y = i / layer;
            let z = (i % layer) / per_axis;
            let x = i % per_axis;
            Vec3::new(
                start + x as f64 * spacing,
                start + y as f64 * spacing,
                start + z as f64 * spacing,
            )
        })
        .collect();

    Ok((posits, vec![Vec3::new_zero(); n], vec![params.particle_mass; n]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inside(p: Vec3, b: f64) -> bool {
        p.x.abs() <= b && p.y.abs() <= b && p.z.abs() <= b
    }

    #[test]
    fn random_is_seeded_and_in_box() {
        let params = SimParams {
            num_particles: 200,
            ..Default::default()
        };
        let (a, vels, masses) = Layout::RandomInBox { seed: 3 }.generate(&params).unwrap();
        let (b, _, _) = Layout::RandomInBox { seed: 3 }.generate(&params).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 200);
        assert!(a.iter().all(|p| inside(*p, params.box_size)));
        assert!(vels.iter().all(|v| v.magnitude() == 0.));
        assert!(masses.iter().all(|m| *m == params.particle_mass));
    }

    #[test]
    fn grid_2d_spacing_and_mass() {
        let params = SimParams {
            num_particles: 10,
            smoothing_len: 0.02,
            ..Default::default()
        };
        let (posits, _, masses) = Layout::Grid2d { cols: 4 }.generate(&params).unwrap();

        assert_eq!(posits[5].x, 1. * 0.02 - 0.5);
        assert_eq!(posits[5].y, 1. * 0.02 - 0.5);
        assert_eq!(posits[5].z, 0.);
        assert!((masses[0] - 1_000. * 0.02 * 0.02).abs() < 1e-12);
    }

    #[test]
    fn grid_2d_rejects_sheet_wider_than_box() {
        let params = SimParams {
            num_particles: 100,
            ..Default::default()
        };
        // 50 columns at h = 0.1 reach x = 4.4.
        assert!(matches!(
            Layout::Grid2d { cols: 50 }.generate(&params),
            Err(SimError::InvalidParam(_))
        ));
        // 10 columns reach x = 0.4, and 10 rows reach y = 0.4.
        assert!(Layout::Grid2d { cols: 10 }.generate(&params).is_ok());

        let small_box = SimParams {
            num_particles: 4,
            box_size: 0.25,
            ..Default::default()
        };
        assert!(Layout::Grid2d { cols: 2 }.generate(&small_box).is_err());
    }

    #[test]
    fn invalid_params_are_rejected_before_sampling() {
        let tiny_box = SimParams {
            box_size: 5e-4,
            ..Default::default()
        };
        let nan_box = SimParams {
            box_size: f64::NAN,
            ..Default::default()
        };

        for params in [tiny_box, nan_box] {
            for layout in [
                Layout::RandomInBox { seed: 1 },
                Layout::Grid2d { cols: 10 },
                Layout::Grid3d { spacing: 0.1 },
            ] {
                assert!(matches!(
                    layout.generate(&params),
                    Err(SimError::InvalidParam(_))
                ));
            }
        }
    }

    #[test]
    fn grid_3d_fills_from_floor() {
        let params = SimParams {
            num_particles: 30,
            ..Default::default()
        };
        let (posits, _, _) = Layout::Grid3d { spacing: 0.5 }.generate(&params).unwrap();

        // 4 per axis; the first 16 particles make up the bottom layer.
        assert!(posits[..16].iter().all(|p| p.y == -0.75));
        assert!(posits[16..].iter().all(|p| p.y == -0.25));
        assert!(posits.iter().all(|p| inside(*p, params.box_size)));
    }

    #[test]
    fn grid_3d_rejects_overfull_box() {
        let params = SimParams {
            num_particles: 100,
            ..Default::default()
        };
        assert!(Layout::Grid3d { spacing: 0.5 }.generate(&params).is_err());
    }
}
