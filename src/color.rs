//! Visualization colors. Derived from the physical state after each step; never read back by the physics.

use bincode::{Decode, Encode};
use lin_alg::f64::Vec3;

use crate::particles::ParticleStore;

pub type Color = (f32, f32, f32);

const GREEN: Color = (0., 1., 0.);
const RED: Color = (1., 0., 0.);
const YELLOW: Color = (1., 1., 0.);
const GREY: Color = (0.5, 0.5, 0.5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Encode, Decode)]
pub enum ColorMode {
    /// Velocity direction and magnitude, relative to the fastest particle this step.
    Speed,
    /// Sparse particles are green, near rest density red, and compressed ones yellow.
    #[default]
    Density,
}

fn lerp(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0., 1.);
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

pub fn color_from_vel(vel: Vec3, max_speed: f64) -> Color {
    if max_speed <= 0. {
        return GREY;
    }
    let c = |v: f64| (0.5 + v / (2. * max_speed)) as f32;
    (c(vel.x), c(vel.y), c(vel.z))
}

pub fn color_from_density(density: f64, rest_density: f64) -> Color {
    if density < rest_density {
        lerp(GREEN, RED, (density / rest_density) as f32)
    } else {
        lerp(RED, YELLOW, ((density - rest_density) / rest_density) as f32)
    }
}

/// Recompute the store's colors from its current velocities or densities.
pub fn update_colors(particles: &mut ParticleStore, mode: ColorMode, rest_density: f64) {
    particles.colors = match mode {
        ColorMode::Speed => {
            let max_speed = particles
                .vels
                .iter()
                .map(|v| v.magnitude())
                .fold(0., f64::max);

            particles
                .vels
                .iter()
                .map(|v| color_from_vel(*v, max_speed))
                .collect()
        }
        ColorMode::Density => particles
            .densities
            .iter()
            .map(|rho| color_from_density(*rho, rest_density))
            .collect(),
    };
}
