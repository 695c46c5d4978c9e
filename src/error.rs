//! Error types for the simulation core.

use std::fmt;

use thiserror::Error;

/// The stage of a step a fault was detected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    DensityPressure,
    Force,
    Integrate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DensityPressure => "density/pressure",
            Self::Force => "force",
            Self::Integrate => "integration",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FaultKind {
    /// Density is zero, negative, or NaN.
    DegenerateDensity(f64),
    /// A value went to NaN or infinity.
    NonFinite,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateDensity(rho) => write!(f, "degenerate density ({rho})"),
            Self::NonFinite => write!(f, "non-finite value"),
        }
    }
}

/// A numerical fault on a single particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleFault {
    pub index: usize,
    pub kind: FaultKind,
}

impl fmt::Display for ParticleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "particle {}: {}", self.index, self.kind)
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Particle array `{name}` has length {actual}; expected {expected}")]
    ParticleCount {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Particle {index} has invalid mass {mass}")]
    InvalidMass { index: usize, mass: f64 },

    #[error("Particle {index} has a non-finite initial state")]
    InvalidInitialState { index: usize },

    #[error("Simulation unstable at step {step}, {phase} phase: {fault}")]
    Unstable {
        step: usize,
        phase: Phase,
        fault: ParticleFault,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Plot error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
