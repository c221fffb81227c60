use super::geometry::Region;
use crate::routines::store::Store;
use crate::structs::observation::ObservationRecord;
use crate::structs::parameters::ParameterPoint;
use crate::structs::region::{AbcRun, AcceptedRegion, Variant};
use eyre::Result;

/// Whether the true parameters were recovered by the informed and the uninformed run of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    BothSucceeded,
    BothFailed,
    OnlyUninformed,
    OnlyInformed,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::BothSucceeded,
        Outcome::BothFailed,
        Outcome::OnlyUninformed,
        Outcome::OnlyInformed,
    ];

    pub fn classify(with_hm: bool, without_hm: bool) -> Self {
        match (with_hm, without_hm) {
            (true, true) => Outcome::BothSucceeded,
            (false, false) => Outcome::BothFailed,
            (false, true) => Outcome::OnlyUninformed,
            (true, false) => Outcome::OnlyInformed,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::BothSucceeded => write!(f, "both_succeeded"),
            Outcome::BothFailed => write!(f, "both_failed"),
            Outcome::OnlyUninformed => write!(f, "only_uninformed"),
            Outcome::OnlyInformed => write!(f, "only_informed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub both_succeeded: usize,
    pub both_failed: usize,
    pub only_uninformed: usize,
    pub only_informed: usize,
}

impl OutcomeTally {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::BothSucceeded => self.both_succeeded += 1,
            Outcome::BothFailed => self.both_failed += 1,
            Outcome::OnlyUninformed => self.only_uninformed += 1,
            Outcome::OnlyInformed => self.only_informed += 1,
        }
    }

    pub fn get(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::BothSucceeded => self.both_succeeded,
            Outcome::BothFailed => self.both_failed,
            Outcome::OnlyUninformed => self.only_uninformed,
            Outcome::OnlyInformed => self.only_informed,
        }
    }

    pub fn total(&self) -> usize {
        Outcome::ALL.iter().map(|o| self.get(*o)).sum()
    }
}

/// Comparison of the informed and the uninformed ABC run of a single sample
#[derive(Debug, Clone, PartialEq)]
pub struct AbcRow {
    pub results_dir: String,
    pub truth: ParameterPoint,
    pub contained_with_hm: bool,
    pub contained_without_hm: bool,
    pub outcome: Outcome,
    pub runs_with_hm: u64,
    pub runs_without_hm: u64,
    /// Simulator runs spent on history matching, if recorded
    pub hm_runs: Option<u64>,
}

impl AbcRow {
    /// Simulator runs saved by the informed prior
    pub fn saving(&self) -> i64 {
        self.runs_without_hm as i64 - self.runs_with_hm as i64
    }

    /// Saving less the simulator runs history matching itself needed
    pub fn net_saving(&self) -> Option<i64> {
        self.hm_runs.map(|hm| self.saving() - hm as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbcSummary {
    pub rows: Vec<AbcRow>,
    pub tally: OutcomeTally,
    pub mean_runs_with_hm: Option<f64>,
    pub mean_runs_without_hm: Option<f64>,
    pub mean_saving: Option<f64>,
    /// Averaged over the samples with a recorded history matching cost
    pub mean_net_saving: Option<f64>,
}

fn contains(run: &AbcRun, truth: &ParameterPoint) -> bool {
    match Region::from_points(&run.points()) {
        Some(region) => region.contains(truth),
        None => false,
    }
}

/// Compare the two runs of one sample
pub fn compare(
    record: &ObservationRecord,
    with_hm: &AbcRun,
    without_hm: &AbcRun,
    hm_runs: Option<u64>,
) -> AbcRow {
    let contained_with_hm = contains(with_hm, &record.parameters);
    let contained_without_hm = contains(without_hm, &record.parameters);
    AbcRow {
        results_dir: record.results_dir.clone(),
        truth: record.parameters,
        contained_with_hm,
        contained_without_hm,
        outcome: Outcome::classify(contained_with_hm, contained_without_hm),
        runs_with_hm: with_hm.total_runs(),
        runs_without_hm: without_hm.total_runs(),
        hm_runs,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}

pub fn summarise(rows: Vec<AbcRow>) -> AbcSummary {
    let mut tally = OutcomeTally::default();
    for row in &rows {
        tally.add(row.outcome);
    }
    AbcSummary {
        tally,
        mean_runs_with_hm: mean(rows.iter().map(|r| r.runs_with_hm as f64)),
        mean_runs_without_hm: mean(rows.iter().map(|r| r.runs_without_hm as f64)),
        mean_saving: mean(rows.iter().map(|r| r.saving() as f64)),
        mean_net_saving: mean(rows.iter().filter_map(|r| r.net_saving()).map(|s| s as f64)),
        rows,
    }
}

fn log_mean(label: &str, value: Option<f64>) {
    match value {
        Some(value) => tracing::info!("{}: {:.1}", label, value),
        None => tracing::info!("{}: n/a", label),
    }
}

/// Analyse every sample for which both ABC rejection runs exist
pub fn analyse(store: &Store, records: &[ObservationRecord]) -> Result<AbcSummary> {
    let mut rows = Vec::new();
    for record in records {
        if !Variant::ALL.iter().all(|v| store.has_abc_run(record, *v)) {
            continue;
        }
        let with_hm = store.read_abc_run(record, Variant::Informed)?;
        let without_hm = store.read_abc_run(record, Variant::Uninformed)?;
        let hm_runs = store.status(record)?.hm_runs;
        let row = compare(record, &with_hm, &without_hm, hm_runs);
        tracing::debug!("{}: {}", row.results_dir, row.outcome);
        rows.push(row);
    }

    let summary = summarise(rows);
    let tally = &summary.tally;
    tracing::info!("Samples with both ABC runs: {}", tally.total());
    tracing::info!("Both succeeded: {}", tally.both_succeeded);
    tracing::info!("Both failed: {}", tally.both_failed);
    tracing::info!("Only without history matching succeeded: {}", tally.only_uninformed);
    tracing::info!("Only with history matching succeeded: {}", tally.only_informed);
    log_mean("Average runs with history matching", summary.mean_runs_with_hm);
    log_mean("Average runs without history matching", summary.mean_runs_without_hm);
    log_mean("Average saving", summary.mean_saving);
    log_mean("Average saving including history matching", summary.mean_net_saving);
    Ok(summary)
}
