//! Per-particle state, stored as parallel arrays. Index `i` refers to the same particle in every array.

use lin_alg::f64::Vec3;

use crate::{
    color::Color,
    error::{Result, SimError},
    params::SimParams,
    particle_creation::Layout,
    util::vec_is_finite,
};

/// Smoothed-particle hydrodynamics particle state.
#[derive(Clone, Debug)]
pub struct ParticleStore {
    pub posits: Vec<Vec3>,
    pub vels: Vec<Vec3>,
    /// Constant after creation.
    pub masses: Vec<f64>,
    // The fields below are recomputed from scratch each step, and carry no meaning between steps.
    /// Local density
    pub densities: Vec<f64>,
    pub pressures: Vec<f64>,
    pub forces: Vec<Vec3>,
    /// For visualization only; never read by the physics.
    pub colors: Vec<Color>,
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(SimError::ParticleCount {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

impl ParticleStore {
    /// Creates a store, validating it against `params`. Derived arrays start zeroed.
    pub fn new(
        posits: Vec<Vec3>,
        vels: Vec<Vec3>,
        masses: Vec<f64>,
        params: &SimParams,
    ) -> Result<Self> {
        let n = params.num_particles;
        check_len("posits", n, posits.len())?;
        check_len("vels", n, vels.len())?;
        check_len("masses", n, masses.len())?;

        for (index, &mass) in masses.iter().enumerate() {
            if !mass.is_finite() || mass <= 0. {
                return Err(SimError::InvalidMass { index, mass });
            }
        }

        for (index, (posit, vel)) in posits.iter().zip(&vels).enumerate() {
            if !vec_is_finite(*posit) || !vec_is_finite(*vel) {
                return Err(SimError::InvalidInitialState { index });
            }
        }

        Ok(Self {
            posits,
            vels,
            masses,
            densities: vec![0.; n],
            pressures: vec![0.; n],
            forces: vec![Vec3::new_zero(); n],
            colors: vec![(0., 0., 1.); n],
        })
    }

    pub fn from_layout(layout: &Layout, params: &SimParams) -> Result<Self> {
        let (posits, vels, masses) = layout.generate(params)?;
        Self::new(posits, vels, masses, params)
    }

    pub fn len(&self) -> usize {
        self.posits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posits.is_empty()
    }
}
