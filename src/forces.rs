//! Force accumulation: pressure, viscosity, and gravity, from neighbors within h.
//!
//! Pressure uses the symmetric form, so the pair terms on i and j are equal and opposite:
//! f_p,i = -Σⱼ mⱼ (pᵢ/ρᵢ² + pⱼ/ρⱼ²) ∇W_spiky(xᵢ - xⱼ, h)
//!
//! f_v,i = μ Σⱼ mⱼ (vⱼ - vᵢ) / ρⱼ ∇²W_visc(r, h)
//!
//! f_g,i = mᵢ g

use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::{kernels::KernelCoeffs, neighbors::NeighborLists, params::SimParams};

/// Per-particle force, split by source.
#[derive(Clone, Copy, Debug)]
pub struct ForceTerms {
    pub pressure: Vec3,
    pub viscosity: Vec3,
    pub gravity: Vec3,
}

impl ForceTerms {
    pub fn total(&self) -> Vec3 {
        self.pressure + self.viscosity + self.gravity
    }
}

/// Read-only per-step inputs to the force phase. Borrowed from the particle store.
pub struct ForceInputs<'a> {
    pub posits: &'a [Vec3],
    pub vels: &'a [Vec3],
    pub masses: &'a [f64],
    pub densities: &'a [f64],
    pub pressures: &'a [f64],
}

/// Pressure force on i from j alone. Swapping i and j negates the result.
pub fn pressure_pair(inputs: &ForceInputs, i: usize, j: usize, kernel: &KernelCoeffs) -> Vec3 {
    let grad = kernel.spiky_grad(inputs.posits[i] - inputs.posits[j]);

    let p_term = inputs.pressures[i] / inputs.densities[i].powi(2)
        + inputs.pressures[j] / inputs.densities[j].powi(2);

    grad * (-inputs.masses[j] * p_term)
}

pub fn viscosity_pair(
    inputs: &ForceInputs,
    i: usize,
    j: usize,
    kernel: &KernelCoeffs,
    viscosity: f64,
) -> Vec3 {
    let r = (inputs.posits[j] - inputs.posits[i]).magnitude();
    let lap = kernel.visc_laplacian(r);

    (inputs.vels[j] - inputs.vels[i]) * (viscosity * inputs.masses[j] * lap / inputs.densities[j])
}

/// All force contributions acting on a single particle.
pub fn force_terms(
    i: usize,
    inputs: &ForceInputs,
    neighbors: &[usize],
    kernel: &KernelCoeffs,
    params: &SimParams,
) -> ForceTerms {
    let mut pressure = Vec3::new_zero();
    let mut viscosity = Vec3::new_zero();

    for &j in neighbors {
        pressure += pressure_pair(inputs, i, j, kernel);
        viscosity += viscosity_pair(inputs, i, j, kernel, params.viscosity);
    }

    ForceTerms {
        pressure,
        viscosity,
        gravity: params.gravity * inputs.masses[i],
    }
}

/// Force breakdowns for every particle, in parallel.
pub fn accumulate_terms(
    inputs: &ForceInputs,
    neighbors: &NeighborLists,
    params: &SimParams,
) -> Vec<ForceTerms> {
    let kernel = KernelCoeffs::new(params.smoothing_len);

    (0..inputs.posits.len())
        .into_par_iter()
        .map(|i| force_terms(i, inputs, neighbors.of(i), &kernel, params))
        .collect()
}

/// Total force on every particle.
pub fn accumulate_with(
    inputs: &ForceInputs,
    neighbors: &NeighborLists,
    params: &SimParams,
) -> Vec<Vec3> {
    accumulate_terms(inputs, neighbors, params)
        .par_iter()
        .map(ForceTerms::total)
        .collect()
}

/// As `accumulate_with`, building neighbor lists using the configured search mode.
pub fn accumulate(
    posits: &[Vec3],
    vels: &[Vec3],
    masses: &[f64],
    densities: &[f64],
    pressures: &[f64],
    params: &SimParams,
) -> Vec<Vec3> {
    let neighbors = NeighborLists::build(posits, params.smoothing_len, params.neighbor_search);
    let inputs = ForceInputs {
        posits,
        vels,
        masses,
        densities,
        pressures,
    };
    accumulate_with(&inputs, &neighbors, params)
}
