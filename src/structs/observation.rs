use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

use super::criteria::Criteria;
use super::parameters::ParameterPoint;

/// The summary statistics produced by one run of the territory model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    Abundance,
    Variation,
    Vacancies,
}

impl Output {
    pub const ALL: [Output; 3] = [Output::Abundance, Output::Variation, Output::Vacancies];

    pub fn name(&self) -> &'static str {
        match self {
            Output::Abundance => "abundance",
            Output::Variation => "variation",
            Output::Vacancies => "vacancies",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Output::Abundance => 0,
            Output::Variation => 1,
            Output::Vacancies => 2,
        }
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One set of model outputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputTriple {
    pub abundance: f64,
    pub variation: f64,
    pub vacancies: f64,
}

impl OutputTriple {
    pub fn new(abundance: f64, variation: f64, vacancies: f64) -> Self {
        OutputTriple {
            abundance,
            variation,
            vacancies,
        }
    }

    pub fn get(&self, output: Output) -> f64 {
        match output {
            Output::Abundance => self.abundance,
            Output::Variation => self.variation,
            Output::Vacancies => self.vacancies,
        }
    }
}

/// The noisy observations generated for one ground-truth [ParameterPoint]
///
/// `results_dir` is the name of the directory, relative to the output folder, where all later stages write their
/// results for this sample. It is derived from the (rounded) parameters, see [ParameterPoint::dir_name].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub index: usize,
    pub parameters: ParameterPoint,
    pub observations: Vec<OutputTriple>,
    pub results_dir: String,
}

impl ObservationRecord {
    pub fn new(
        index: usize,
        parameters: ParameterPoint,
        observations: Vec<OutputTriple>,
        rounding: u32,
    ) -> Self {
        ObservationRecord {
            index,
            results_dir: parameters.dir_name(rounding),
            parameters,
            observations,
        }
    }

    /// The observed values of a single output across all replications
    pub fn values(&self, output: Output) -> Vec<f64> {
        self.observations.iter().map(|o| o.get(output)).collect()
    }

    /// Acceptance criteria, the observed `(min, max)` of each output
    pub fn criteria(&self) -> Result<Criteria> {
        if self.observations.is_empty() {
            bail!("Sample {} has no observations", self.results_dir);
        }
        Criteria::from_observations(&self.observations)
    }
}
