//! Bulk properties of the particle set, and plots of them.

use std::fmt;

use lin_alg::f64::Vec3;
use plotters::{
    element::{Circle, PathElement},
    prelude::{BitMapBackend, ChartBuilder, Color, IntoDrawingArea, RGBColor, BLACK, BLUE, WHITE},
    series::LineSeries,
};

use crate::{
    error::{Result, SimError},
    particles::ParticleStore,
    playback::Frame,
};

#[derive(Clone, Copy, Debug)]
pub struct Stats {
    pub kinetic_energy: f64,
    /// Total linear momentum.
    pub momentum: Vec3,
    pub max_speed: f64,
    pub density_min: f64,
    pub density_max: f64,
}

impl Stats {
    pub fn new(particles: &ParticleStore) -> Self {
        let mut kinetic_energy = 0.;
        let mut momentum = Vec3::new_zero();
        let mut max_speed: f64 = 0.;

        for (vel, mass) in particles.vels.iter().zip(&particles.masses) {
            let speed = vel.magnitude();
            kinetic_energy += 0.5 * mass * speed * speed;
            momentum += *vel * *mass;
            max_speed = max_speed.max(speed);
        }

        let (density_min, density_max) = particles
            .densities
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), rho| {
                (min.min(*rho), max.max(*rho))
            });

        Self {
            kinetic_energy,
            momentum,
            max_speed,
            density_min,
            density_max,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KE: {:.4e} |p|: {:.4e} v max: {:.3} ρ: [{:.1}, {:.1}]",
            self.kinetic_energy,
            self.momentum.magnitude(),
            self.max_speed,
            self.density_min,
            self.density_max
        )
    }
}

fn plot_err<E: fmt::Display>(e: E) -> SimError {
    SimError::Plot(e.to_string())
}

/// Find the range of the data, padded so a constant series still has a drawable axis.
fn range(vals: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = vals.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });

    if !min.is_finite() || !max.is_finite() {
        return (0., 1.);
    }
    if max - min < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    (min, max)
}

/// Save a 2d line plot, e.g. kinetic energy over time, as `{filename}.png`.
pub fn plot(
    data: &[(f64, f64)],
    x_label: &str,
    y_label: &str,
    plot_title: &str,
    filename: &str,
) -> Result<()> {
    let x_range = range(data.iter().map(|(x, _)| *x));
    let y_range = range(data.iter().map(|(_, y)| *y));

    let fname = format!("{filename}.png");
    let root = BitMapBackend::new(&fname, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(plot_title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range.0..x_range.1, y_range.0..y_range.1)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(data.iter().cloned(), BLUE))
        .map_err(plot_err)?
        .label(y_label)
        .legend(|(x, y)| PathElement::new([(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Save an x-y projection of a frame as `{filename}.png`, with the domain box as the axes.
pub fn plot_frame(frame: &Frame, box_size: f64, filename: &str) -> Result<()> {
    let fname = format!("{filename}.png");
    let root = BitMapBackend::new(&fname, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let b = box_size as f32;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Step {}, t = {:.3}", frame.step, frame.time),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(30)
        .build_cartesian_2d(-b..b, -b..b)
        .map_err(plot_err)?;

    chart.configure_mesh().draw().map_err(plot_err)?;

    chart
        .draw_series(frame.posits.iter().zip(&frame.colors).map(|(p, c)| {
            let color = RGBColor(
                (c.0.clamp(0., 1.) * 255.) as u8,
                (c.1.clamp(0., 1.) * 255.) as u8,
                (c.2.clamp(0., 1.) * 255.) as u8,
            );
            Circle::new((p.x, p.y), 2, color.filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
