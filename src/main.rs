//! Headless driver: runs a simulation from a saved (or default) config, records snapshots for
//! playback, and plots the result.

use std::{path::Path, process, time::Instant};

use bincode::{Decode, Encode};
use log::{error, info};

use sph_fluid::{
    color::ColorMode,
    properties::{self, Stats},
    util, Layout, ParticleStore, SimParams, Simulation, SnapshotRecorder, StopHandle, StopReason,
};

const SAVE_FILE: &str = "config.sph";
const DEFAULT_SNAPSHOT_FILE: &str = "snapshots.sph";

#[derive(Debug, Encode, Decode)]
pub struct Config {
    sim: SimParams,
    num_steps: usize,
    /// Keep every n-th frame for playback.
    snapshot_ratio: usize,
    /// Log stats, and sample kinetic energy for the plot, every n steps.
    stats_ratio: usize,
    layout: Layout,
    color_mode: ColorMode,
    snapshot_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sim: SimParams::default(),
            num_steps: 5_000,
            snapshot_ratio: 20,
            stats_ratio: 250,
            layout: Layout::RandomInBox { seed: 0 },
            color_mode: ColorMode::Speed,
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_owned(),
        }
    }
}

fn run(cfg: &Config) -> sph_fluid::Result<()> {
    let particles = ParticleStore::from_layout(&cfg.layout, &cfg.sim)?;
    let mut sim = Simulation::new(cfg.sim.clone(), particles)?;
    sim.color_mode = cfg.color_mode;

    info!(
        "Running {} particles for {} steps. h: {} dt: {} neighbor search: {:?}",
        cfg.sim.num_particles, cfg.num_steps, cfg.sim.smoothing_len, cfg.sim.dt, cfg.sim.neighbor_search
    );

    let mut recorder = SnapshotRecorder::new(cfg.snapshot_ratio);
    recorder.frames.push(sim.frame()); // Initial snapshot; t=0.

    let stop = StopHandle::new();
    let chunk = cfg.stats_ratio.max(1);

    let mut energy = vec![(0., Stats::new(sim.particles()).kinetic_energy)];
    let mut particles_reset = 0;
    let start = Instant::now();

    while sim.step_count() < cfg.num_steps {
        let steps = chunk.min(cfg.num_steps - sim.step_count());
        let summary = sim.run(&mut recorder, steps, &stop)?;
        particles_reset += summary.particles_reset;

        let stats = Stats::new(sim.particles());
        info!(
            "Step: {} t: {:.3} {stats} Elapsed: {}ms",
            sim.step_count(),
            sim.time(),
            start.elapsed().as_millis()
        );
        energy.push((sim.time(), stats.kinetic_energy));

        if summary.stop_reason != StopReason::MaxSteps {
            info!("Stopped early: {:?}", summary.stop_reason);
            break;
        }
    }

    if particles_reset > 0 {
        info!("Particles reset during the run: {particles_reset}");
    }
    info!("Run complete.");

    recorder.save(Path::new(&cfg.snapshot_file))?;
    info!(
        "Saved {} snapshots to {}",
        recorder.frames.len(),
        cfg.snapshot_file
    );

    properties::plot(
        &energy,
        "t (s)",
        "Kinetic energy (J)",
        "Kinetic energy",
        "kinetic_energy",
    )?;
    properties::plot_frame(&sim.frame(), cfg.sim.box_size, "final_frame")?;

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match util::load::<Config>(Path::new(SAVE_FILE)) {
        Ok(cfg) => {
            info!("Loaded config from {SAVE_FILE}");
            cfg
        }
        Err(e) => {
            info!("No usable config at {SAVE_FILE} ({e}); using defaults.");
            let cfg = Config::default();
            if let Err(e) = util::save(Path::new(SAVE_FILE), &cfg) {
                error!("Error saving config: {e}");
            }
            cfg
        }
    };

    if let Err(e) = run(&cfg) {
        error!("{e}");
        process::exit(1);
    }
}
