use super::{SampleState, SampleStatus};
use crate::routines::initialization::sample_space;
use crate::routines::settings::Settings;
use crate::routines::store::Store;
use crate::simulator::{derive_seed, Model};
use crate::structs::observation::ObservationRecord;
use eyre::{bail, Result};
use std::collections::HashSet;

/// Seed stream of the observation replications
const OBSERVATION_STREAM: u64 = 0x0b5e;

/// Sample the parameter space and generate noisy observations for every sample
///
/// Each record is appended to the observations file as soon as its replications are complete. When observations
/// already exist, generation continues after the last stored record; the stored records must match the sample drawn
/// with the current settings. A record left incomplete by an interrupted append is removed and generated again.
pub fn generate<M: Model>(settings: &Settings, store: &Store, model: &M) -> Result<Vec<ObservationRecord>> {
    let experiment = &settings.experiment;
    let bounds = settings.parameters.bounds()?;
    let points = sample_space(experiment, &bounds)?;

    let mut names = HashSet::new();
    for point in &points {
        let name = point.dir_name(experiment.rounding);
        if !names.insert(name.clone()) {
            bail!(
                "Two samples share the results directory '{}'. Increase the rounding or change the seed",
                name
            );
        }
    }

    let mut records = store.repair_observations()?;
    if records.len() > points.len() {
        bail!(
            "{} holds {} observations, but only {} samples are configured",
            store.observations_path().display(),
            records.len(),
            points.len()
        );
    }
    for (record, point) in records.iter().zip(&points) {
        if record.parameters != *point {
            bail!(
                "Stored observation {} ({}) does not match the configured sample ({}). Use a new output folder for a different experiment",
                record.index,
                record.parameters,
                point
            );
        }
    }
    if !records.is_empty() {
        tracing::info!("Resuming after {} stored observations", records.len());
    }

    let seed = derive_seed(experiment.seed, OBSERVATION_STREAM);
    for (index, point) in points.iter().enumerate().skip(records.len()) {
        let span = tracing::info_span!("sample", index);
        let _enter = span.enter();

        let pending = ObservationRecord::new(index, *point, Vec::new(), experiment.rounding);
        store.set_status(&pending, &SampleState::new(SampleStatus::Sampled))?;

        let observations =
            model.run_ensemble(point, experiment.repetitions, derive_seed(seed, index as u64))?;
        let record = ObservationRecord {
            observations,
            ..pending
        };

        store.set_status(&record, &SampleState::new(SampleStatus::Observed))?;
        store.append_observation(&record)?;
        tracing::info!("Observed {} in {}", point, record.results_dir);
        records.push(record);
    }

    tracing::info!(
        "{} observations stored in {}",
        records.len(),
        store.observations_path().display()
    );
    Ok(records)
}
