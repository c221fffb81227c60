use crate::routines::settings::{Experiment, Sampler};
use crate::structs::parameters::{Bounds, ParameterPoint};
use eyre::Result;

pub mod latin;
pub mod sobol;

/// This function draws the ground-truth parameter points according to the sampler specified in the [Experiment]
///
/// The points are rounded to the configured number of decimals, so that they are exactly representable by the name
/// of their results directory.
pub fn sample_space(experiment: &Experiment, bounds: &Bounds) -> Result<Vec<ParameterPoint>> {
    let points = match experiment.sampler {
        Sampler::Sobol => sobol::generate(experiment.samples, bounds, experiment.seed as u32)?,
        Sampler::Latin => latin::generate(experiment.samples, bounds, experiment.seed)?,
    };
    Ok(points
        .into_iter()
        .map(|p| p.rounded(experiment.rounding))
        .collect())
}
