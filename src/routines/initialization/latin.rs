use crate::structs::parameters::{Bounds, ParameterPoint};
use eyre::Result;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Generates Latin Hypercube Sampling points within the given bounds.
///
/// This function samples the space using a Latin Hypercube Sampling of `n_points` points: every dimension is split
/// into `n_points` intervals of equal width, and each interval holds exactly one point.
///
/// # Arguments
///
/// * `n_points` - The number of points in the Latin Hypercube Sampling.
/// * `bounds` - The bounds each dimension is scaled to.
/// * `seed` - The seed for the random number generator.
///
/// # Returns
///
/// A vector of points, each scaled to be within the corresponding range of `bounds`.
///
pub fn generate(n_points: usize, bounds: &Bounds, seed: u64) -> Result<Vec<ParameterPoint>> {
    let mut seq = vec![[0.0; 2]; n_points];
    let mut rng = StdRng::seed_from_u64(seed);

    for (j, (min, max)) in bounds.ranges().into_iter().enumerate() {
        let mut intervals: Vec<f64> = (0..n_points).map(|i| i as f64).collect();
        intervals.shuffle(&mut rng);

        for (i, interval) in intervals.iter().enumerate() {
            let value = rng.gen::<f64>();
            seq[i][j] = min + ((interval + value) / n_points as f64) * (max - min);
        }
    }
    Ok(seq.into_iter().map(ParameterPoint::from_array).collect())
}
