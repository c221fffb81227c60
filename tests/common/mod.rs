#![allow(dead_code)]

use eyre::Result;
use hoopoes::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// A cheap stand-in for the territory model that counts its runs
///
/// Abundance and vacancies depend linearly on one parameter each, plus uniform noise in `[-0.5, 0.5)` derived from
/// the seed. Variation is constant.
#[derive(Debug, Default)]
pub struct Counting {
    calls: AtomicUsize,
}

impl Counting {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

fn noise(seed: u64, stream: u64) -> f64 {
    (derive_seed(seed, stream) >> 11) as f64 / (1u64 << 53) as f64 - 0.5
}

impl Model for Counting {
    fn simulate(&self, point: &ParameterPoint, seed: u64) -> Result<OutputTriple> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OutputTriple::new(
            20.0 * point.scout_prob + noise(seed, 0),
            1.0,
            200.0 * (1.0 - point.survival_prob) + noise(seed, 1),
        ))
    }
}

/// Small settings writing into a fresh temporary folder
pub fn test_settings() -> (TempDir, Settings) {
    let dir = tempfile::tempdir().expect("Failed to create a temporary folder");
    let mut settings = Settings::new();
    settings.experiment.samples = 4;
    settings.experiment.repetitions = 5;
    settings.experiment.seed = 42;
    settings.experiment.output = dir.path().to_string_lossy().into_owned();
    settings.hm.waves = 3;
    settings.hm.points = 128;
    settings.hm.repetitions = 3;
    settings.abc.accepted = 20;
    settings.abc.criteria = CriteriaScope::AllOutputs;
    settings.abc.max_attempts = 1_000_000;
    settings.log.write = false;
    (dir, settings)
}
