use crate::algorithms::abc::AbcDriver;
use crate::algorithms::history_matching::HistoryMatchingDriver;
use crate::algorithms::{observations, SampleStatus, Stage, StageReport};
use crate::analysis;
use crate::analysis::abc::AbcSummary;
use crate::analysis::hm::HmSummary;
use crate::routines::output;
use crate::routines::settings::Settings;
use crate::routines::store::Store;
use crate::simulator::{Engine, Model};
use crate::structs::observation::ObservationRecord;
use eyre::Result;
use std::time::Instant;

fn store(settings: &Settings) -> Store {
    Store::new(settings.output_folder())
}

/// Generate the observations with the simulator selected in the settings
pub fn observe(settings: &Settings) -> Result<Vec<ObservationRecord>> {
    observe_with(settings, &Engine::new(&settings.model)?)
}

pub fn observe_with<M: Model>(settings: &Settings, model: &M) -> Result<Vec<ObservationRecord>> {
    let now = Instant::now();
    tracing::info!("Generating observations for {} samples", settings.experiment.samples);
    let records = observations::generate(settings, &store(settings), model)?;
    tracing::info!("Observations generated in {:.2?}", now.elapsed());
    Ok(records)
}

/// Run history matching for every observed sample
pub fn history_match(settings: &Settings) -> Result<StageReport> {
    history_match_with(settings, &Engine::new(&settings.model)?)
}

pub fn history_match_with<M: Model>(settings: &Settings, model: &M) -> Result<StageReport> {
    let now = Instant::now();
    let store = store(settings);
    let records = store.load_observations()?;
    let report = HistoryMatchingDriver::new(settings, &store, model).run(&records)?;
    tracing::info!("History matching finished in {:.2?}", now.elapsed());
    Ok(report)
}

/// Summarise the history matching results and write `hm_analysis.csv`
pub fn analyse_hm(settings: &Settings) -> Result<HmSummary> {
    let store = store(settings);
    let records = store.load_observations()?;
    let summary = analysis::hm::analyse(&store, &records, &settings.parameters.bounds()?)?;
    let path = output::write_hm_summary(&settings.experiment.output, &summary)?;
    tracing::info!("History matching results written to {}", path.display());
    Ok(summary)
}

/// Run both ABC rejection variants for every sample with a non-empty non-implausible space
pub fn abc(settings: &Settings) -> Result<StageReport> {
    abc_with(settings, &Engine::new(&settings.model)?)
}

pub fn abc_with<M: Model>(settings: &Settings, model: &M) -> Result<StageReport> {
    let now = Instant::now();
    let store = store(settings);
    let records = store.load_observations()?;
    let report = AbcDriver::new(settings, &store, model).run(&records)?;
    tracing::info!("ABC rejection finished in {:.2?}", now.elapsed());
    Ok(report)
}

/// Compare the ABC rejection runs and write `abc_analysis.csv`
pub fn analyse_abc(settings: &Settings) -> Result<AbcSummary> {
    let store = store(settings);
    let records = store.load_observations()?;
    let summary = analysis::abc::analyse(&store, &records)?;
    let path = output::write_abc_summary(&settings.experiment.output, &summary)?;
    tracing::info!("ABC rejection results written to {}", path.display());
    Ok(summary)
}

/// Results of a complete run of the experiment
#[derive(Debug, Clone)]
pub struct ExperimentResults {
    pub records: Vec<ObservationRecord>,
    pub hm: HmSummary,
    pub abc: AbcSummary,
}

/// Run every stage of the experiment in turn
pub fn run_all(settings: &Settings) -> Result<ExperimentResults> {
    run_all_with(settings, &Engine::new(&settings.model)?)
}

pub fn run_all_with<M: Model>(settings: &Settings, model: &M) -> Result<ExperimentResults> {
    let records = observe_with(settings, model)?;
    history_match_with(settings, model)?;
    let hm = analyse_hm(settings)?;
    abc_with(settings, model)?;
    let abc = analyse_abc(settings)?;
    Ok(ExperimentResults { records, hm, abc })
}

/// Number of samples in each state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Configured samples without a stored observation
    pub pending: usize,
    pub counts: Vec<(SampleStatus, usize)>,
}

impl StatusReport {
    pub fn count(&self, status: SampleStatus) -> usize {
        self.counts
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "not yet observed: {}", self.pending)?;
        for (status, count) in &self.counts {
            writeln!(f, "{}: {}", status, count)?;
        }
        Ok(())
    }
}

pub fn status(settings: &Settings) -> Result<StatusReport> {
    let store = store(settings);
    let records = store.read_observations()?;
    let mut counts: Vec<(SampleStatus, usize)> = SampleStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for record in &records {
        let state = store.status(record)?;
        if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == state.status) {
            entry.1 += 1;
        }
    }
    let report = StatusReport {
        pending: settings.experiment.samples.saturating_sub(records.len()),
        counts,
    };

    tracing::debug!("{} of {} samples observed", records.len(), settings.experiment.samples);
    Ok(report)
}
