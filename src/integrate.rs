use lin_alg::f64::Vec3;
use rayon::prelude::*;

use crate::{
    error::{FaultKind, ParticleFault},
    params::SimParams,
};

/// Reflect one coordinate off the walls at ±`box_size`. Returns the new (coordinate, velocity).
fn reflect_axis(x: f64, v: f64, params: &SimParams) -> (f64, f64) {
    let b = params.box_size;

    if x > b {
        (b - params.boundary_offset, -v.abs() * params.restitution)
    } else if x < -b {
        (-b + params.boundary_offset, v.abs() * params.restitution)
    } else {
        (x, v)
    }
}

/// Clamp a particle inside the domain box, reflecting and damping the velocity component
/// normal to each wall crossed. Each axis is handled independently, so corners resolve in one pass.
pub fn apply_boundary(posit: &mut Vec3, vel: &mut Vec3, params: &SimParams) {
    (posit.x, vel.x) = reflect_axis(posit.x, vel.x, params);
    (posit.y, vel.y) = reflect_axis(posit.y, vel.y, params);
    (posit.z, vel.z) = reflect_axis(posit.z, vel.z, params);
}

/// Semi-implicit (symplectic) Euler for one particle: velocity first, then position using the
/// updated velocity.
pub fn integrate_euler_semi_implicit(
    posit: Vec3,
    vel: Vec3,
    force: Vec3,
    density: f64,
    params: &SimParams,
) -> (Vec3, Vec3) {
    let mut vel = vel + force * (params.dt / density);
    let mut posit = posit + vel * params.dt;

    apply_boundary(&mut posit, &mut vel, params);
    (posit, vel)
}

/// Advance every particle one step. Returns new position and velocity arrays; the inputs
/// are untouched, so the caller decides whether to commit them. A non-positive density is a
/// precondition violation, and is reported rather than divided by.
pub fn integrate(
    posits: &[Vec3],
    vels: &[Vec3],
    forces: &[Vec3],
    densities: &[f64],
    params: &SimParams,
) -> Result<(Vec<Vec3>, Vec<Vec3>), ParticleFault> {
    if let Some(index) = densities.iter().position(|rho| !(*rho > 0.)) {
        return Err(ParticleFault {
            index,
            kind: FaultKind::DegenerateDensity(densities[index]),
        });
    }

    Ok(posits
        .par_iter()
        .zip(vels.par_iter())
        .zip(forces.par_iter())
        .zip(densities.par_iter())
        .map(|(((posit, vel), force), rho)| {
            integrate_euler_semi_implicit(*posit, *vel, *force, *rho, params)
        })
        .unzip())
}
