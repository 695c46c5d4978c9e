//! Simulation parameters. These are immutable for the duration of a run; replace them
//! wholesale (see `Simulation::reset`) to change them.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;

use crate::{
    error::{Result, SimError},
    util::vec_is_finite,
};

/// How neighbors within the smoothing length are found each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Encode, Decode)]
pub enum NeighborSearch {
    /// Scan every other particle. O(N^2).
    AllPairs,
    /// Bucket particles in a uniform grid of cell size h; scan the 27 surrounding cells.
    #[default]
    Grid,
}

/// What to do when a particle's force or integrated state goes non-finite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Encode, Decode)]
pub enum FaultPolicy {
    /// Abort the step, keeping the last valid state, and report the fault.
    #[default]
    Halt,
    /// Put the offending particle back at its previous position, at rest, and continue.
    /// Density faults still halt.
    ResetParticle,
}

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct SimParams {
    /// N. Fixed for the lifetime of a particle store.
    pub num_particles: usize,
    pub dt: f64,
    /// h: The kernel support radius.
    pub smoothing_len: f64,
    /// ρ₀
    pub rest_density: f64,
    /// k: Equation-of-state gain.
    pub stiffness: f64,
    /// μ
    pub viscosity: f64,
    pub gravity: Vec3,
    /// Half-extent of the axis-aligned domain, centered at the origin.
    pub box_size: f64,
    /// Used by layouts that don't derive mass from h.
    pub particle_mass: f64,
    /// Fraction of normal velocity kept, with sign flipped, after hitting a wall.
    pub restitution: f64,
    /// ε: How far inside the wall a clamped particle is placed.
    pub boundary_offset: f64,
    pub neighbor_search: NeighborSearch,
    pub fault_policy: FaultPolicy,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            num_particles: 1_000,
            dt: 1.0e-3,
            smoothing_len: 0.1,
            rest_density: 1_000.,
            stiffness: 1_000.,
            viscosity: 0.1,
            gravity: Vec3::new(0., -9.81, 0.),
            box_size: 1.0,
            // Gives an isolated particle roughly the rest density, at h = 0.1.
            particle_mass: 0.64,
            restitution: 0.5,
            boundary_offset: 1.0e-3,
            neighbor_search: NeighborSearch::Grid,
            fault_policy: FaultPolicy::Halt,
        }
    }
}

fn positive(name: &str, val: f64) -> Result<()> {
    if !val.is_finite() || val <= 0. {
        return Err(SimError::InvalidParam(format!(
            "{name} must be positive and finite; got {val}"
        )));
    }
    Ok(())
}

fn non_negative(name: &str, val: f64) -> Result<()> {
    if !val.is_finite() || val < 0. {
        return Err(SimError::InvalidParam(format!(
            "{name} must be non-negative and finite; got {val}"
        )));
    }
    Ok(())
}

impl SimParams {
    /// Reject configurations that can't produce a meaningful run. Run this before the loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(SimError::InvalidParam(
                "num_particles must be at least 1".to_owned(),
            ));
        }

        positive("dt", self.dt)?;
        positive("smoothing_len", self.smoothing_len)?;
        positive("rest_density", self.rest_density)?;
        positive("box_size", self.box_size)?;
        positive("particle_mass", self.particle_mass)?;
        non_negative("stiffness", self.stiffness)?;
        non_negative("viscosity", self.viscosity)?;
        non_negative("boundary_offset", self.boundary_offset)?;

        if !vec_is_finite(self.gravity) {
            return Err(SimError::InvalidParam("gravity must be finite".to_owned()));
        }

        if !(0. ..=1.).contains(&self.restitution) {
            return Err(SimError::InvalidParam(format!(
                "restitution must be in [0, 1]; got {}",
                self.restitution
            )));
        }

        if self.boundary_offset >= self.box_size {
            return Err(SimError::InvalidParam(format!(
                "boundary_offset ({}) must be smaller than box_size ({})",
                self.boundary_offset, self.box_size
            )));
        }

        Ok(())
    }

    /// Mass for a planar layout at spacing h: ρ₀h².
    pub fn mass_2d(&self) -> f64 {
        self.rest_density * self.smoothing_len.powi(2)
    }
}
