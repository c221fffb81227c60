use crate::structs::observation::ObservationRecord;
use eyre::Result;
use serde::{Deserialize, Serialize};

pub mod abc;
pub mod history_matching;
pub mod observations;

/// The stage of the experiment a sample has reached
///
/// ```text
/// Sampled -> Observed -> HmDone -> AbcDone
///                     \-> HmEmpty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    /// The parameters were drawn, but the observations are not yet complete
    Sampled,
    /// Observations were generated
    Observed,
    /// History matching found a non-empty non-implausible space
    HmDone,
    /// History matching ruled out the entire space; no further stage runs
    HmEmpty,
    /// Both ABC rejection runs completed
    AbcDone,
}

impl SampleStatus {
    pub const ALL: [SampleStatus; 5] = [
        SampleStatus::Sampled,
        SampleStatus::Observed,
        SampleStatus::HmDone,
        SampleStatus::HmEmpty,
        SampleStatus::AbcDone,
    ];

    /// Whether history matching has completed for the sample
    pub fn hm_complete(&self) -> bool {
        matches!(
            self,
            SampleStatus::HmDone | SampleStatus::HmEmpty | SampleStatus::AbcDone
        )
    }
}

impl std::fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleStatus::Sampled => write!(f, "Sampled"),
            SampleStatus::Observed => write!(f, "Observed"),
            SampleStatus::HmDone => write!(f, "History matching done"),
            SampleStatus::HmEmpty => write!(f, "Empty non-implausible space"),
            SampleStatus::AbcDone => write!(f, "ABC rejection done"),
        }
    }
}

/// The persisted state of a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleState {
    pub status: SampleStatus,
    /// Number of simulator runs spent on history matching
    pub hm_runs: Option<u64>,
    /// Time of the last transition
    pub updated: String,
}

impl SampleState {
    pub fn new(status: SampleStatus) -> Self {
        SampleState {
            status,
            hm_runs: None,
            updated: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn with_hm_runs(mut self, hm_runs: u64) -> Self {
        self.hm_runs = Some(hm_runs);
        self
    }

    /// Move to `status`, keeping the history matching cost
    pub fn advance(&self, status: SampleStatus) -> Self {
        SampleState {
            status,
            hm_runs: self.hm_runs,
            updated: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// The outcome of processing a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing to do for the sample in its current state
    Skipped(SampleStatus),
    /// The sample moved to a new state, spending `simulator_runs` runs
    Completed {
        status: SampleStatus,
        simulator_runs: u64,
    },
}

/// Summary of one pass of a [Stage] over all samples
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub completed: usize,
    pub skipped: usize,
    pub simulator_runs: u64,
}

/// A stage of the experiment that is applied to every observation record in turn
///
/// Stages are resumable: [Stage::process] inspects the persisted [SampleStatus] and skips samples it has already
/// handled, so that an interrupted pass can simply be started again.
pub trait Stage {
    fn name(&self) -> &'static str;

    fn process(&mut self, record: &ObservationRecord) -> Result<Progress>;

    fn run(&mut self, records: &[ObservationRecord]) -> Result<StageReport> {
        let mut report = StageReport::default();
        for record in records {
            let span = tracing::info_span!("sample", dir = %record.results_dir);
            let _enter = span.enter();
            match self.process(record)? {
                Progress::Skipped(status) => {
                    tracing::debug!("Skipped, sample is in state '{}'", status);
                    report.skipped += 1;
                }
                Progress::Completed {
                    status,
                    simulator_runs,
                } => {
                    tracing::info!("{} ({} simulator runs)", status, simulator_runs);
                    report.completed += 1;
                    report.simulator_runs += simulator_runs;
                }
            }
        }
        tracing::info!(
            "{}: {} samples completed, {} skipped, {} simulator runs",
            self.name(),
            report.completed,
            report.skipped,
            report.simulator_runs
        );
        Ok(report)
    }
}
