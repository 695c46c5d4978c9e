//! Density estimation and the equation of state.
//!
//! ρᵢ = Σⱼ mⱼ W_poly6(|xⱼ - xᵢ|, h), including the self term (j = i, r = 0). Density is never
//! carried between steps; it's recomputed from positions each time.
//!
//! pᵢ = k(ρᵢ - ρ₀). Negative pressure (tension) is intentional, and not clamped.

use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::{kernels::KernelCoeffs, neighbors::NeighborLists, params::SimParams};

/// Linear, weakly-compressible equation of state.
pub fn pressure(density: f64, rest_density: f64, stiffness: f64) -> f64 {
    stiffness * (density - rest_density)
}

/// Density at a single particle, from its precomputed neighbor list.
pub fn density_at(
    i: usize,
    posits: &[Vec3],
    masses: &[f64],
    neighbors: &[usize],
    kernel: &KernelCoeffs,
) -> f64 {
    let mut result = masses[i] * kernel.poly6(0.);

    for &j in neighbors {
        let r_sq = (posits[j] - posits[i]).magnitude_squared();
        result += masses[j] * kernel.poly6(r_sq);
    }

    result
}

/// Computes `(densities, pressures)` for all particles, in parallel. Each particle's sum is
/// evaluated serially, so repeated calls on the same input are bit-identical.
pub fn eval_density_pressure_with(
    posits: &[Vec3],
    masses: &[f64],
    neighbors: &NeighborLists,
    params: &SimParams,
) -> (Vec<f64>, Vec<f64>) {
    let kernel = KernelCoeffs::new(params.smoothing_len);

    let densities: Vec<f64> = (0..posits.len())
        .into_par_iter()
        .map(|i| density_at(i, posits, masses, neighbors.of(i), &kernel))
        .collect();

    let pressures = densities
        .par_iter()
        .map(|rho| pressure(*rho, params.rest_density, params.stiffness))
        .collect();

    (densities, pressures)
}

/// As `eval_density_pressure_with`, building neighbor lists using the configured search mode.
pub fn eval_density_pressure(
    posits: &[Vec3],
    masses: &[f64],
    params: &SimParams,
) -> (Vec<f64>, Vec<f64>) {
    let neighbors = NeighborLists::build(posits, params.smoothing_len, params.neighbor_search);
    eval_density_pressure_with(posits, masses, &neighbors, params)
}
