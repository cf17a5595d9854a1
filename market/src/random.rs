//! Injectable randomness seam.
//
//  The simulator (and the probabilistic time_interval trigger downstream)
//  draw through this trait so tests can replay a fixed sequence.

use std::sync::Mutex;

use rand::Rng;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send + Sync {
    fn unit(&self) -> f64;
}

/// Production source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Replays a fixed sequence of draws, wrapping around at the end.
///
/// Test-only in spirit, but lives here so every crate's test suite can
/// share it without a dev-dependency cycle.
#[derive(Debug)]
pub struct FixedSequence {
    draws: Vec<f64>,
    next: Mutex<usize>,
}

impl FixedSequence {
    pub fn new(draws: Vec<f64>) -> Self {
        assert!(!draws.is_empty(), "FixedSequence needs at least one draw");
        Self {
            draws,
            next: Mutex::new(0),
        }
    }
}

impl RandomSource for FixedSequence {
    fn unit(&self) -> f64 {
        let mut idx = self.next.lock().unwrap();
        let v = self.draws[*idx % self.draws.len()];
        *idx += 1;
        v
    }
}
