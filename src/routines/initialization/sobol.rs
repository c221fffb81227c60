use crate::structs::parameters::{Bounds, ParameterPoint};
use eyre::{bail, Result};
use sobol_burley::sample;

/// Generates points of a Sobol sequence within the given bounds.
///
/// This function samples the space using a scrambled Sobol sequence of `n_points` points.
/// The same `seed` always yields the same points.
///
/// # Arguments
///
/// * `n_points` - The number of points in the Sobol sequence.
/// * `bounds` - The bounds each dimension is scaled to.
/// * `seed` - The seed for the Sobol sequence generator.
///
/// # Returns
///
/// A vector of points, each scaled to be within the corresponding range of `bounds`.
///
pub fn generate(n_points: usize, bounds: &Bounds, seed: u32) -> Result<Vec<ParameterPoint>> {
    if n_points > u32::MAX as usize {
        bail!("Cannot draw more than {} points from a Sobol sequence", u32::MAX);
    }
    let ranges = bounds.ranges();
    let points = (0..n_points as u32)
        .map(|i| {
            let values = [0u32, 1].map(|dim| {
                let unscaled = sample(i, dim, seed) as f64;
                let (lower, upper) = ranges[dim as usize];
                lower + unscaled * (upper - lower)
            });
            ParameterPoint::from_array(values)
        })
        .collect();
    Ok(points)
}
