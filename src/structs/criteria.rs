use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

use super::observation::{Output, OutputTriple};

/// Which outputs the ABC distance is computed over
///
/// Criteria are always derived for all three outputs. [CriteriaScope::LastOutput] applies only the vacancies
/// criterion, which is how earlier results of the experiment were produced. The choice is recorded in the settings
/// written alongside the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaScope {
    /// Only the vacancies criterion is applied
    #[default]
    LastOutput,
    /// Abundance, variation and vacancies are all applied
    AllOutputs,
}

impl CriteriaScope {
    pub fn outputs(&self) -> &'static [Output] {
        match self {
            CriteriaScope::LastOutput => &[Output::Vacancies],
            CriteriaScope::AllOutputs => &Output::ALL,
        }
    }
}

/// Acceptance interval `(min, max)` for each output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    ranges: [(f64, f64); 3],
}

impl Criteria {
    pub fn new(abundance: (f64, f64), variation: (f64, f64), vacancies: (f64, f64)) -> Result<Self> {
        let ranges = [abundance, variation, vacancies];
        for (output, (lower, upper)) in Output::ALL.iter().zip(ranges.iter()) {
            if !(lower <= upper) {
                bail!(
                    "Criterion for {} must satisfy min <= max, got ({}, {})",
                    output,
                    lower,
                    upper
                );
            }
        }
        Ok(Criteria { ranges })
    }

    /// The observed range of each output over a set of replications
    pub fn from_observations(observations: &[OutputTriple]) -> Result<Self> {
        if observations.is_empty() {
            bail!("Cannot derive criteria from an empty set of observations");
        }
        let [abundance, variation, vacancies] = Output::ALL.map(|output| {
            observations
                .iter()
                .map(|o| o.get(output))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                })
        });
        Criteria::new(abundance, variation, vacancies)
    }

    pub fn range(&self, output: Output) -> (f64, f64) {
        self.ranges[output.index()]
    }

    /// Midpoint of the acceptance interval
    pub fn target(&self, output: Output) -> f64 {
        let (lower, upper) = self.range(output);
        (lower + upper) / 2.0
    }

    pub fn half_width(&self, output: Output) -> f64 {
        let (lower, upper) = self.range(output);
        (upper - lower) / 2.0
    }

    /// Distance of a simulated output from the criteria
    ///
    /// For every output in `scope`, the amount by which the value falls outside its interval is divided by the
    /// interval width (or by one, for a zero-width interval). The distance is the sum over outputs, and is zero when
    /// every value lies inside its interval.
    pub fn distance(&self, output: &OutputTriple, scope: CriteriaScope) -> f64 {
        scope
            .outputs()
            .iter()
            .map(|o| {
                let (lower, upper) = self.range(*o);
                let value = output.get(*o);
                let excess = if value < lower {
                    lower - value
                } else if value > upper {
                    value - upper
                } else {
                    0.0
                };
                let width = upper - lower;
                let scale = if width > 0.0 { width } else { 1.0 };
                excess / scale
            })
            .sum()
    }
}
