//! The hand-off between the simulation and whatever displays it, and recording of
//! computed frames for later playback.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use bincode::{Decode, Encode};
use lin_alg::f32::Vec3 as Vec3f32;

use crate::{
    color::Color,
    error::Result,
    particles::ParticleStore,
    util::{self, vec_to_f32},
};

/// An immutable copy of a completed step, for display. Owned, so the simulation can start the
/// next step while a presenter still holds it.
#[derive(Clone, Debug, Encode, Decode)]
pub struct Frame {
    pub step: usize,
    pub time: f64,
    // To save memory, we store frames as f32; we only need f64 precision
    // during the integration.
    pub posits: Vec<Vec3f32>,
    pub colors: Vec<Color>,
}

impl Frame {
    pub fn new(step: usize, time: f64, particles: &ParticleStore) -> Self {
        Self {
            step,
            time,
            posits: particles.posits.iter().map(|p| vec_to_f32(*p)).collect(),
            colors: particles.colors.clone(),
        }
    }
}

/// Receives each completed step. Implemented by displays, recorders, etc.
pub trait Presenter {
    /// Queried once per step, before it runs. Return false to stop, e.g. when a window closes.
    fn should_continue(&mut self) -> bool {
        true
    }

    fn present(&mut self, frame: &Frame);
}

/// A stop request that can be sent from another thread. The simulation only checks it between steps.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Keeps every `ratio`-th frame.
#[derive(Debug)]
pub struct SnapshotRecorder {
    pub ratio: usize,
    pub frames: Vec<Frame>,
}

impl SnapshotRecorder {
    pub fn new(ratio: usize) -> Self {
        Self {
            ratio: ratio.max(1),
            frames: Vec::new(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        util::save(path, &self.frames)
    }

    pub fn load(path: &Path) -> Result<Vec<Frame>> {
        util::load(path)
    }
}

impl Presenter for SnapshotRecorder {
    fn present(&mut self, frame: &Frame) {
        if frame.step % self.ratio == 0 {
            self.frames.push(frame.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use lin_alg::f64::Vec3;

    use super::*;
    use crate::params::SimParams;

    fn store() -> ParticleStore {
        let params = SimParams {
            num_particles: 2,
            ..Default::default()
        };
        ParticleStore::new(
            vec![Vec3::new(0.25, 0.5, 0.), Vec3::new(-1., 0., 0.5)],
            vec![Vec3::new_zero(); 2],
            vec![1.; 2],
            &params,
        )
        .unwrap()
    }

    #[test]
    fn frame_copies_positions_and_colors() {
        let particles = store();
        let frame = Frame::new(3, 0.003, &particles);

        assert_eq!(frame.posits.len(), 2);
        assert_eq!(frame.posits[0].x, 0.25);
        assert_eq!(frame.posits[1].z, 0.5);
        assert_eq!(frame.colors, particles.colors);
    }

    #[test]
    fn recorder_keeps_every_nth() {
        let particles = store();
        let mut rec = SnapshotRecorder::new(3);
        for step in 1..=10 {
            rec.present(&Frame::new(step, step as f64, &particles));
        }

        let steps: Vec<usize> = rec.frames.iter().map(|f| f.step).collect();
        assert_eq!(steps, vec![3, 6, 9]);
    }

    #[test]
    fn stop_handle_is_shared() {
        let stop = StopHandle::new();
        let remote = stop.clone();
        assert!(!stop.is_stopped());

        std::thread::spawn(move || remote.stop()).join().unwrap();
        assert!(stop.is_stopped());
    }

    #[test]
    fn saved_frames_load_back() {
        let particles = store();
        let mut rec = SnapshotRecorder::new(1);
        rec.present(&Frame::new(1, 0.5, &particles));

        let path = std::env::temp_dir().join("sph_fluid_frames_test.sph");
        rec.save(&path).unwrap();
        let loaded = SnapshotRecorder::load(&path).unwrap();
        let _ = std::fs::remove_file(path);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].step, 1);
        assert_eq!(loaded[0].posits[0].y, 0.5);
    }
}
