use crate::analysis::abc::AbcSummary;
use crate::analysis::hm::HmSummary;
use crate::structs::parameters::Shrinkage;
use csv::WriterBuilder;
use eyre::{Result, WrapErr};
use std::fs::{create_dir_all, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Contains all the necessary information of an output file
#[derive(Debug)]
pub struct OutputFile {
    pub file: File,
    pub relative_path: PathBuf,
}

impl OutputFile {
    pub fn new(folder: &str, file_name: &str) -> Result<Self> {
        let relative_path = Path::new(&folder).join(file_name);

        if let Some(parent) = relative_path.parent() {
            create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directories for {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&relative_path)
            .wrap_err_with(|| format!("Failed to open file: {:?}", relative_path))?;

        Ok(OutputFile {
            file,
            relative_path,
        })
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the per-sample history matching results to `hm_analysis.csv`
pub fn write_hm_summary(folder: &str, summary: &HmSummary) -> Result<PathBuf> {
    let outputfile = OutputFile::new(folder, "hm_analysis.csv")?;
    let path = outputfile.relative_path.clone();
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(outputfile.file);

    writer.write_record([
        "results_dir",
        "scout_prob",
        "survival_prob",
        "scout_prob_lower",
        "scout_prob_upper",
        "survival_prob_lower",
        "survival_prob_upper",
        "scout_prob_ratio",
        "survival_prob_ratio",
        "scout_prob_exceeds",
        "survival_prob_exceeds",
        "scout_prob_discarded",
        "survival_prob_discarded",
        "empty",
        "hm_runs",
    ])?;

    for row in &summary.rows {
        let [scout, survival] = match row.bounds {
            Some(bounds) => [
                Some(bounds.scout_prob),
                Some(bounds.survival_prob),
            ],
            None => [None, None],
        };
        let ratio = |dim: usize| {
            row.shrinkage.map(|s| match s[dim] {
                Shrinkage::Within(ratio) | Shrinkage::Exceeds(ratio) => ratio,
            })
        };
        let exceeds = |dim: usize| row.shrinkage.map(|s| matches!(s[dim], Shrinkage::Exceeds(_)));
        writer.write_record(&[
            row.results_dir.clone(),
            row.truth.scout_prob.to_string(),
            row.truth.survival_prob.to_string(),
            opt(scout.map(|b| b.0)),
            opt(scout.map(|b| b.1)),
            opt(survival.map(|b| b.0)),
            opt(survival.map(|b| b.1)),
            opt(ratio(0)),
            opt(ratio(1)),
            opt(exceeds(0)),
            opt(exceeds(1)),
            row.discarded[0].to_string(),
            row.discarded[1].to_string(),
            row.is_empty().to_string(),
            opt(row.hm_runs),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Writes the per-sample comparison of the ABC rejection runs to `abc_analysis.csv`
pub fn write_abc_summary(folder: &str, summary: &AbcSummary) -> Result<PathBuf> {
    let outputfile = OutputFile::new(folder, "abc_analysis.csv")?;
    let path = outputfile.relative_path.clone();
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(outputfile.file);

    writer.write_record([
        "results_dir",
        "scout_prob",
        "survival_prob",
        "contained_with_hm",
        "contained_without_hm",
        "outcome",
        "runs_with_hm",
        "runs_without_hm",
        "saving",
        "hm_runs",
        "net_saving",
    ])?;

    for row in &summary.rows {
        writer.write_record(&[
            row.results_dir.clone(),
            row.truth.scout_prob.to_string(),
            row.truth.survival_prob.to_string(),
            row.contained_with_hm.to_string(),
            row.contained_without_hm.to_string(),
            row.outcome.to_string(),
            row.runs_with_hm.to_string(),
            row.runs_without_hm.to_string(),
            row.saving().to_string(),
            opt(row.hm_runs),
            opt(row.net_saving()),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}
