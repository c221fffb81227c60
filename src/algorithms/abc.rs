use super::{Progress, SampleStatus, Stage};
use crate::routines::settings::{Abc, Settings};
use crate::routines::store::Store;
use crate::simulator::{derive_seed, Model};
use crate::structs::criteria::Criteria;
use crate::structs::observation::ObservationRecord;
use crate::structs::parameters::Bounds;
use crate::structs::region::{AbcPoint, AbcRun, AcceptedRegion, Variant};
use eyre::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed stream of the ABC rejection stage
const ABC_STREAM: u64 = 0x0abc;

/// ABC rejection sampling with a uniform prior over `prior`
///
/// Candidates are drawn from the prior and simulated once each. A candidate is accepted when the distance of its
/// output from the criteria does not exceed the threshold. Sampling continues until the configured number of points
/// has been accepted, and fails once the maximum number of attempts is exhausted.
pub fn reject<M: Model>(
    model: &M,
    prior: &Bounds,
    criteria: &Criteria,
    settings: &Abc,
    variant: Variant,
    seed: u64,
) -> Result<AbcRun> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(settings.accepted);
    let mut attempts: u64 = 0;
    let mut total: u64 = 0;

    while points.len() < settings.accepted {
        if total >= settings.max_attempts {
            bail!(
                "ABC rejection ({}) accepted only {}/{} points within {} attempts",
                variant,
                points.len(),
                settings.accepted,
                settings.max_attempts
            );
        }
        let candidate = prior.sample_uniform(&mut rng);
        let output = model.simulate(&candidate, rng.gen())?;
        attempts += 1;
        total += 1;

        let distance = criteria.distance(&output, settings.criteria);
        if distance <= settings.threshold {
            points.push(AbcPoint {
                point: candidate,
                attempts,
                distance,
            });
            attempts = 0;
        }
    }

    Ok(AbcRun {
        variant,
        prior: *prior,
        threshold: settings.threshold,
        points,
    })
}

/// Runs ABC rejection with an informed and an uninformed prior for every sample with a non-empty
/// non-implausible space
pub struct AbcDriver<'a, M: Model> {
    settings: &'a Settings,
    store: &'a Store,
    model: &'a M,
}

impl<'a, M: Model> AbcDriver<'a, M> {
    pub fn new(settings: &'a Settings, store: &'a Store, model: &'a M) -> Self {
        AbcDriver {
            settings,
            store,
            model,
        }
    }

    fn prior(&self, record: &ObservationRecord, variant: Variant) -> Result<Bounds> {
        match variant {
            Variant::Uninformed => self.settings.parameters.bounds(),
            Variant::Informed => {
                let wave = match self.store.last_wave(record)? {
                    Some(wave) => wave,
                    None => bail!(
                        "Sample {} finished history matching, but no wave was found in {}",
                        record.results_dir,
                        self.store.sample_dir(record).display()
                    ),
                };
                match wave.bounds() {
                    Some(bounds) => Ok(bounds),
                    None => bail!(
                        "Sample {} has an empty non-implausible space",
                        record.results_dir
                    ),
                }
            }
        }
    }
}

impl<'a, M: Model> Stage for AbcDriver<'a, M> {
    fn name(&self) -> &'static str {
        "ABC rejection"
    }

    fn process(&mut self, record: &ObservationRecord) -> Result<Progress> {
        let state = self.store.status(record)?;
        if state.status != SampleStatus::HmDone {
            return Ok(Progress::Skipped(state.status));
        }

        let criteria = record.criteria()?;
        let base = derive_seed(derive_seed(self.settings.experiment.seed, ABC_STREAM), record.index as u64);
        let mut simulator_runs = 0;

        for (stream, variant) in Variant::ALL.iter().enumerate() {
            if self.store.has_abc_run(record, *variant) {
                tracing::debug!("Found existing {} run", variant);
                continue;
            }
            let prior = self.prior(record, *variant)?;
            tracing::debug!("Running {} ABC rejection with prior {}", variant, prior);
            let run = reject(
                self.model,
                &prior,
                &criteria,
                &self.settings.abc,
                *variant,
                derive_seed(base, stream as u64),
            )?;
            simulator_runs += run.total_runs();
            self.store.write_abc_run(record, &run)?;
        }

        self.store
            .set_status(record, &state.advance(SampleStatus::AbcDone))?;
        Ok(Progress::Completed {
            status: SampleStatus::AbcDone,
            simulator_runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::criteria::CriteriaScope;
    use crate::structs::observation::OutputTriple;
    use crate::structs::parameters::ParameterPoint;

    /// Outputs are a deterministic function of the parameters
    struct Linear;

    impl Model for Linear {
        fn simulate(&self, point: &ParameterPoint, _seed: u64) -> Result<OutputTriple> {
            Ok(OutputTriple::new(
                20.0 * point.scout_prob,
                1.0,
                200.0 * (1.0 - point.survival_prob),
            ))
        }
    }

    #[test]
    fn test_reject_accepts_within_threshold() {
        let criteria = Criteria::new((4.0, 6.0), (0.0, 2.0), (4.0, 6.0)).unwrap();
        let settings = Abc {
            accepted: 50,
            threshold: 0.0,
            criteria: CriteriaScope::AllOutputs,
            max_attempts: 1_000_000,
        };
        let run = reject(&Linear, &Bounds::default(), &criteria, &settings, Variant::Uninformed, 3).unwrap();
        assert_eq!(run.points.len(), 50);
        assert!(run.total_runs() >= 50);
        for p in &run.points {
            assert!(p.attempts >= 1);
            assert_eq!(p.distance, 0.0);
            // abundance in [4, 6] and vacancies in [4, 6]
            assert!(p.point.scout_prob >= 0.2 - 1e-12 && p.point.scout_prob <= 0.3 + 1e-12);
            assert!(p.point.survival_prob >= 0.97 - 1e-12 && p.point.survival_prob <= 0.98 + 1e-12);
        }
    }

    #[test]
    fn test_reject_gives_up() {
        let criteria = Criteria::new((100.0, 101.0), (0.0, 2.0), (100.0, 101.0)).unwrap();
        let settings = Abc {
            accepted: 5,
            threshold: 0.0,
            criteria: CriteriaScope::AllOutputs,
            max_attempts: 100,
        };
        assert!(reject(&Linear, &Bounds::default(), &criteria, &settings, Variant::Informed, 3).is_err());
    }

    #[test]
    fn test_reject_is_reproducible() {
        let criteria = Criteria::new((4.0, 6.0), (0.0, 2.0), (4.0, 6.0)).unwrap();
        let settings = Abc {
            accepted: 10,
            ..Abc::default()
        };
        let first = reject(&Linear, &Bounds::default(), &criteria, &settings, Variant::Informed, 11).unwrap();
        let second = reject(&Linear, &Bounds::default(), &criteria, &settings, Variant::Informed, 11).unwrap();
        assert_eq!(first, second);
    }
}
