//! Smoothed-particle hydrodynamics (SPH) fluid simulation, on the CPU.
//!
//! The fluid is a fixed set of particles. Each step runs three phases, in parallel across particles,
//! with a barrier between them:
//!
//! 1. Density, from a poly6 kernel sum over neighbors; pressure from a linear equation of state.
//! 2. Force: symmetric pressure gradient (spiky kernel), viscosity (Laplacian kernel), gravity.
//! 3. Semi-implicit Euler integration, with inelastic reflection off the walls of a box.
//!
//! The state for a step is committed only once all three phases complete without a numerical
//! fault. Display is left to an implementor of [`playback::Presenter`], which receives a copy of
//! each completed step.

pub mod color;
pub mod density;
pub mod error;
pub mod forces;
pub mod integrate;
pub mod kernels;
pub mod neighbors;
pub mod params;
pub mod particle_creation;
pub mod particles;
pub mod playback;
pub mod properties;
pub mod sim;
pub mod util;

pub use error::{Result, SimError};
pub use params::{FaultPolicy, NeighborSearch, SimParams};
pub use particle_creation::Layout;
pub use particles::ParticleStore;
pub use playback::{Frame, Presenter, SnapshotRecorder, StopHandle};
pub use sim::{RunSummary, Simulation, StepReport, StopReason};
