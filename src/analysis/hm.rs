use crate::routines::store::Store;
use crate::structs::observation::ObservationRecord;
use crate::structs::parameters::{Bounds, ParameterPoint, Shrinkage, PARAMETERS};
use crate::structs::region::AcceptedRegion;
use eyre::{bail, Result};

/// History matching result of a single sample
#[derive(Debug, Clone, PartialEq)]
pub struct HmRow {
    pub results_dir: String,
    pub truth: ParameterPoint,
    /// Bounds of the final non-implausible space, `None` if it is empty
    pub bounds: Option<Bounds>,
    pub shrinkage: Option<[Shrinkage; 2]>,
    /// Per parameter, whether the true value fell outside the non-implausible bounds
    pub discarded: [bool; 2],
    pub hm_runs: Option<u64>,
}

impl HmRow {
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }
}

/// Statistics over the history matching results of all samples
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HmSummary {
    pub rows: Vec<HmRow>,
    /// Number of (sample, parameter) pairs where the true value was ruled out
    pub discarded: usize,
    /// Number of samples whose non-implausible space was empty
    pub empty: usize,
    /// Number of (sample, parameter) pairs whose bounds exceeded the original bounds
    pub exceeded: usize,
    /// Mean ratio of the non-implausible to the original width, per parameter
    pub mean_shrinkage: [Option<f64>; 2],
}

/// Compare the final non-implausible space of a sample with the original bounds and the true parameters
pub fn analyse_region(
    record: &ObservationRecord,
    region: &impl AcceptedRegion,
    original: &Bounds,
    hm_runs: Option<u64>,
) -> HmRow {
    let truth = record.parameters;
    match region.bounds() {
        None => HmRow {
            results_dir: record.results_dir.clone(),
            truth,
            bounds: None,
            shrinkage: None,
            discarded: [false; 2],
            hm_runs,
        },
        Some(bounds) => {
            let target = truth.to_array();
            HmRow {
                results_dir: record.results_dir.clone(),
                truth,
                bounds: Some(bounds),
                shrinkage: Some(bounds.shrinkage(original)),
                discarded: [0, 1].map(|dim| !bounds.contains_dim(dim, target[dim])),
                hm_runs,
            }
        }
    }
}

/// Aggregate the rows of all samples
pub fn summarise(rows: Vec<HmRow>) -> HmSummary {
    let mut summary = HmSummary::default();
    let mut sums = [0.0; 2];
    let mut counts = [0usize; 2];

    for row in &rows {
        if row.is_empty() {
            tracing::info!("{}: Empty plausible space", row.results_dir);
            summary.empty += 1;
            continue;
        }
        for dim in 0..2 {
            if row.discarded[dim] {
                tracing::info!("{}: Target {} discarded", row.results_dir, PARAMETERS[dim]);
                summary.discarded += 1;
            }
            match row.shrinkage.map(|s| s[dim]) {
                Some(Shrinkage::Within(ratio)) => {
                    sums[dim] += ratio;
                    counts[dim] += 1;
                }
                Some(Shrinkage::Exceeds(ratio)) => {
                    tracing::warn!(
                        "{}: Bounds of {} exceed the original bounds (width ratio {:.4})",
                        row.results_dir,
                        PARAMETERS[dim],
                        ratio
                    );
                    summary.exceeded += 1;
                }
                None => {}
            }
        }
    }

    summary.mean_shrinkage = [0, 1].map(|dim| {
        if counts[dim] > 0 {
            Some(sums[dim] / counts[dim] as f64)
        } else {
            None
        }
    });
    summary.rows = rows;
    summary
}

/// Analyse the history matching results of every sample that completed history matching
pub fn analyse(store: &Store, records: &[ObservationRecord], original: &Bounds) -> Result<HmSummary> {
    let mut rows = Vec::new();
    for record in records {
        let state = store.status(record)?;
        if !state.status.hm_complete() {
            continue;
        }
        let wave = match store.last_wave(record)? {
            Some(wave) => wave,
            None => bail!(
                "Sample {} finished history matching, but no wave was found in {}",
                record.results_dir,
                store.sample_dir(record).display()
            ),
        };
        rows.push(analyse_region(record, &wave, original, state.hm_runs));
    }

    let summary = summarise(rows);
    tracing::info!("Total where target parameter was discarded: {}", summary.discarded);
    tracing::info!("Total empty plausible spaces: {}", summary.empty);
    if summary.exceeded > 0 {
        tracing::warn!("Total bounds exceeding the original bounds: {}", summary.exceeded);
    }
    for (name, mean) in PARAMETERS.iter().zip(summary.mean_shrinkage) {
        match mean {
            Some(mean) => tracing::info!("Average remaining width for {}: {:.4}", name, mean),
            None => tracing::info!("Average remaining width for {}: n/a", name),
        }
    }
    Ok(summary)
}
