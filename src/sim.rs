//! Drives simulation steps. Each step runs, in fixed order: neighbor search, density and pressure,
//! forces, integration. Every phase reads only the previous step's state, and writes to new
//! arrays; the store is updated only once all phases complete and pass their health checks. A step
//! that fails leaves the last valid state in place.

use std::time::Instant;

use lin_alg::f64::Vec3;
use log::{debug, trace, warn};

use crate::{
    color::{self, ColorMode},
    density,
    error::{FaultKind, ParticleFault, Phase, Result, SimError},
    forces::{self, ForceInputs},
    integrate,
    neighbors::NeighborLists,
    params::{FaultPolicy, SimParams},
    particles::ParticleStore,
    playback::{Frame, Presenter, StopHandle},
    properties::Stats,
    util::vec_is_finite,
};

/// Log stats at this interval, in steps.
const STATS_RATIO: usize = 1_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Index of the step just completed. The first step is 1.
    pub step: usize,
    /// Particles put back at rest under `FaultPolicy::ResetParticle`.
    pub particles_reset: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    MaxSteps,
    Presenter,
    StopRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub steps_run: usize,
    pub particles_reset: usize,
    pub stop_reason: StopReason,
}

fn first_non_finite_scalar(vals: &[f64]) -> Option<usize> {
    vals.iter().position(|v| !v.is_finite())
}

fn first_bad_density(densities: &[f64]) -> Option<ParticleFault> {
    densities
        .iter()
        .position(|rho| !(*rho > 0.) || !rho.is_finite())
        .map(|index| ParticleFault {
            index,
            kind: FaultKind::DegenerateDensity(densities[index]),
        })
}

pub struct Simulation {
    params: SimParams,
    // Private, so its length always matches `params.num_particles`.
    particles: ParticleStore,
    pub color_mode: ColorMode,
    step: usize,
    time: f64,
}

impl Simulation {
    pub fn new(params: SimParams, particles: ParticleStore) -> Result<Self> {
        params.validate()?;
        if particles.len() != params.num_particles {
            return Err(SimError::ParticleCount {
                name: "particles",
                expected: params.num_particles,
                actual: particles.len(),
            });
        }

        Ok(Self {
            params,
            particles,
            color_mode: ColorMode::default(),
            step: 0,
            time: 0.,
        })
    }

    /// Replace parameters and state wholesale, restarting the run from step 0.
    pub fn reset(&mut self, params: SimParams, particles: ParticleStore) -> Result<()> {
        let color_mode = self.color_mode;
        *self = Self::new(params, particles)?;
        self.color_mode = color_mode;
        Ok(())
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// State as of the last completed step.
    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> usize {
        self.step
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> Frame {
        Frame::new(self.step, self.time, &self.particles)
    }

    fn fault(&self, phase: Phase, fault: ParticleFault) -> SimError {
        SimError::Unstable {
            step: self.step + 1,
            phase,
            fault,
        }
    }

    /// Advance one step. On error, nothing is committed.
    pub fn step(&mut self) -> Result<StepReport> {
        let cfg = &self.params; // Code cleaner.
        let p = &self.particles;
        let start = Instant::now();

        let neighbors = NeighborLists::build(&p.posits, cfg.smoothing_len, cfg.neighbor_search);
        let t_neighbors = start.elapsed();

        // Phase 1: Density and pressure.
        let (densities, pressures) =
            density::eval_density_pressure_with(&p.posits, &p.masses, &neighbors, cfg);

        if let Some(fault) = first_bad_density(&densities) {
            return Err(self.fault(Phase::DensityPressure, fault));
        }
        if let Some(index) = first_non_finite_scalar(&pressures) {
            return Err(self.fault(
                Phase::DensityPressure,
                ParticleFault {
                    index,
                    kind: FaultKind::NonFinite,
                },
            ));
        }
        let t_density = start.elapsed();

        // Phase 2: Forces.
        let inputs = ForceInputs {
            posits: &p.posits,
            vels: &p.vels,
            masses: &p.masses,
            densities: &densities,
            pressures: &pressures,
        };
        let mut forces = forces::accumulate_with(&inputs, &neighbors, cfg);

        let mut reset = vec![false; forces.len()];
        for (i, force) in forces.iter_mut().enumerate() {
            if vec_is_finite(*force) {
                continue;
            }
            match cfg.fault_policy {
                FaultPolicy::Halt => {
                    return Err(self.fault(
                        Phase::Force,
                        ParticleFault {
                            index: i,
                            kind: FaultKind::NonFinite,
                        },
                    ))
                }
                FaultPolicy::ResetParticle => {
                    *force = Vec3::new_zero();
                    reset[i] = true;
                }
            }
        }
        let t_forces = start.elapsed();

        // Phase 3: Integration.
        let (mut posits, mut vels) =
            integrate::integrate(&p.posits, &p.vels, &forces, &densities, cfg)
                .map_err(|fault| self.fault(Phase::Integrate, fault))?;

        for i in 0..posits.len() {
            if !reset[i] && vec_is_finite(posits[i]) && vec_is_finite(vels[i]) {
                continue;
            }
            match cfg.fault_policy {
                FaultPolicy::Halt => {
                    return Err(self.fault(
                        Phase::Integrate,
                        ParticleFault {
                            index: i,
                            kind: FaultKind::NonFinite,
                        },
                    ))
                }
                FaultPolicy::ResetParticle => {
                    posits[i] = p.posits[i];
                    vels[i] = Vec3::new_zero();
                    reset[i] = true;
                }
            }
        }
        let t_integrate = start.elapsed();

        let particles_reset = reset.iter().filter(|r| **r).count();
        if particles_reset > 0 {
            warn!(
                "Step {}: reset {particles_reset} particle(s) with non-finite state",
                self.step + 1
            );
        }

        // Commit. Everything below is infallible.
        let rest_density = self.params.rest_density;
        let dt = self.params.dt;

        let p = &mut self.particles;
        p.posits = posits;
        p.vels = vels;
        p.densities = densities;
        p.pressures = pressures;
        p.forces = forces;
        color::update_colors(p, self.color_mode, rest_density);

        self.step += 1;
        self.time += dt;

        trace!(
            "Step {}: neighbors {}μs (mean {:.1}), density {}μs, forces {}μs, integrate {}μs",
            self.step,
            t_neighbors.as_micros(),
            neighbors.mean_count(),
            (t_density - t_neighbors).as_micros(),
            (t_forces - t_density).as_micros(),
            (t_integrate - t_forces).as_micros(),
        );

        if self.step % STATS_RATIO == 0 {
            debug!("Step {}: {}", self.step, Stats::new(&self.particles));
        }

        Ok(StepReport {
            step: self.step,
            particles_reset,
        })
    }

    /// Run until `max_steps` steps complete, the presenter declines to continue, or a stop is
    /// requested. Stops only ever happen between steps. Each completed step is handed to the
    /// presenter as an owned frame.
    pub fn run<P: Presenter>(
        &mut self,
        presenter: &mut P,
        max_steps: usize,
        stop: &StopHandle,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary {
            steps_run: 0,
            particles_reset: 0,
            stop_reason: StopReason::MaxSteps,
        };

        while summary.steps_run < max_steps {
            if stop.is_stopped() {
                summary.stop_reason = StopReason::StopRequested;
                break;
            }
            if !presenter.should_continue() {
                summary.stop_reason = StopReason::Presenter;
                break;
            }

            let report = self.step()?;
            summary.steps_run += 1;
            summary.particles_reset += report.particles_reset;

            presenter.present(&self.frame());
        }

        Ok(summary)
    }
}
