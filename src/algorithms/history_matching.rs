//! History matching by successive waves of implausibility screening
//!
//! Each wave draws candidate points from the current non-implausible bounds, runs a small ensemble of the model at
//! each of them, and keeps the points whose simulated outputs are not implausible given the observed ranges. The
//! bounds of the kept points are the search space of the next wave.

use super::{Progress, SampleStatus, Stage};
use crate::routines::initialization::sobol;
use crate::routines::settings::{HistoryMatching, Settings};
use crate::routines::store::{self, Store};
use crate::simulator::{derive_seed, Model};
use crate::structs::criteria::Criteria;
use crate::structs::observation::{ObservationRecord, Output, OutputTriple};
use crate::structs::parameters::{Bounds, ParameterPoint};
use crate::structs::region::{AcceptedRegion, Wave, WavePoint};
use eyre::Result;
use rayon::prelude::*;
use std::path::Path;

/// Seed stream of the history matching stage
const HM_STREAM: u64 = 0x484d;

/// Maximum implausibility of an ensemble over all outputs
///
/// For each output, the implausibility is the distance between the ensemble mean and the midpoint of the criterion,
/// in units of the combined standard deviation of the observations (half the width of the criterion) and of the
/// ensemble.
pub fn implausibility(criteria: &Criteria, ensemble: &[OutputTriple]) -> f64 {
    let n = ensemble.len() as f64;
    Output::ALL
        .iter()
        .map(|output| {
            let values: Vec<f64> = ensemble.iter().map(|o| o.get(*output)).collect();
            let mean = values.iter().sum::<f64>() / n;
            let ens_var = if values.len() > 1 {
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
            } else {
                0.0
            };
            let obs_var = criteria.half_width(*output).powi(2);
            let distance = (mean - criteria.target(*output)).abs();
            let sd = (obs_var + ens_var).sqrt();
            if sd > 0.0 {
                distance / sd
            } else if distance == 0.0 {
                0.0
            } else {
                f64::INFINITY
            }
        })
        .fold(0.0, f64::max)
}

/// The result of all waves run for one sample
#[derive(Debug, Clone)]
pub struct HmOutcome {
    pub waves: usize,
    pub simulator_runs: u64,
    pub last: Wave,
}

/// Run one history matching wave within `bounds`
pub fn run_wave<M: Model>(
    model: &M,
    criteria: &Criteria,
    settings: &HistoryMatching,
    bounds: &Bounds,
    wave: usize,
    seed: u64,
) -> Result<Wave> {
    let wave_seed = derive_seed(seed, wave as u64);
    let candidates = sobol::generate(settings.points, bounds, wave_seed as u32)?;

    let evaluated: Vec<(ParameterPoint, f64)> = candidates
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            let ensemble = model.run_ensemble(point, settings.repetitions, derive_seed(wave_seed, i as u64))?;
            Ok((*point, implausibility(criteria, &ensemble)))
        })
        .collect::<Result<Vec<_>>>()?;

    let accepted: Vec<(ParameterPoint, f64)> = evaluated
        .into_iter()
        .filter(|(_, imp)| *imp <= settings.cutoff)
        .collect();
    let weight = 1.0 / accepted.len().max(1) as f64;

    Ok(Wave {
        wave,
        bounds: *bounds,
        candidates: candidates.len(),
        simulator_runs: (candidates.len() * settings.repetitions) as u64,
        points: accepted
            .into_iter()
            .map(|(point, implausibility)| WavePoint {
                point,
                weight,
                implausibility,
            })
            .collect(),
    })
}

/// Refine the non-implausible space in waves, writing every wave to `dir`
///
/// Stops after the configured number of waves, when a wave rules out every candidate, or when a wave shrinks the
/// non-implausible bounds by less than the configured fraction.
pub fn run_waves<M: Model>(
    model: &M,
    criteria: &Criteria,
    settings: &HistoryMatching,
    original: &Bounds,
    dir: &Path,
    seed: u64,
) -> Result<HmOutcome> {
    let mut bounds = *original;
    let mut simulator_runs = 0;
    let mut wave_number = 1;

    loop {
        let wave = run_wave(model, criteria, settings, &bounds, wave_number, seed)?;
        simulator_runs += wave.simulator_runs;
        store::write_wave(dir, &wave)?;
        tracing::debug!(
            "Wave {}: {}/{} candidates non-implausible",
            wave.wave,
            wave.len(),
            wave.candidates
        );

        let next = match wave.bounds() {
            Some(next) => next,
            None => {
                return Ok(HmOutcome {
                    waves: wave_number,
                    simulator_runs,
                    last: wave,
                })
            }
        };

        let reduction = if bounds.area() > 0.0 {
            1.0 - next.area() / bounds.area()
        } else {
            0.0
        };
        if wave_number >= settings.waves || reduction < settings.min_shrinkage {
            return Ok(HmOutcome {
                waves: wave_number,
                simulator_runs,
                last: wave,
            });
        }

        bounds = next;
        wave_number += 1;
    }
}

/// Runs history matching for every observed sample
pub struct HistoryMatchingDriver<'a, M: Model> {
    settings: &'a Settings,
    store: &'a Store,
    model: &'a M,
}

impl<'a, M: Model> HistoryMatchingDriver<'a, M> {
    pub fn new(settings: &'a Settings, store: &'a Store, model: &'a M) -> Self {
        HistoryMatchingDriver {
            settings,
            store,
            model,
        }
    }
}

impl<'a, M: Model> Stage for HistoryMatchingDriver<'a, M> {
    fn name(&self) -> &'static str {
        "History matching"
    }

    fn process(&mut self, record: &ObservationRecord) -> Result<Progress> {
        let state = self.store.status(record)?;
        if state.status != SampleStatus::Observed {
            return Ok(Progress::Skipped(state.status));
        }

        let dir = self.store.sample_dir(record);
        let stale = store::remove_waves(&dir)?;
        if stale > 0 {
            tracing::debug!("Removed {} waves of an interrupted run", stale);
        }

        let criteria = record.criteria()?;
        let seed = derive_seed(derive_seed(self.settings.experiment.seed, HM_STREAM), record.index as u64);
        let outcome = run_waves(
            self.model,
            &criteria,
            &self.settings.hm,
            &self.settings.parameters.bounds()?,
            &dir,
            seed,
        )?;

        let status = if outcome.last.is_empty() {
            SampleStatus::HmEmpty
        } else {
            SampleStatus::HmDone
        };
        self.store
            .set_status(record, &state.advance(status).with_hm_runs(outcome.simulator_runs))?;
        if let Some(bounds) = outcome.last.bounds() {
            tracing::debug!("Non-implausible bounds after {} waves: {}", outcome.waves, bounds);
        }

        Ok(Progress::Completed {
            status,
            simulator_runs: outcome.simulator_runs,
        })
    }
}
