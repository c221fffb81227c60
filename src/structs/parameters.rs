use eyre::{bail, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Names of the two free parameters of the territory model, in dimension order
pub const PARAMETERS: [&str; 2] = ["scout_prob", "survival_prob"];

/// Tolerance used when comparing bounds against each other
const BOUND_EPS: f64 = 1e-12;

/// A single point in the two-dimensional parameter space
///
/// A [ParameterPoint] identifies one ground-truth scenario of the experiment, and is never modified once sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterPoint {
    pub scout_prob: f64,
    pub survival_prob: f64,
}

impl ParameterPoint {
    pub fn new(scout_prob: f64, survival_prob: f64) -> Self {
        ParameterPoint {
            scout_prob,
            survival_prob,
        }
    }

    pub fn from_array(values: [f64; 2]) -> Self {
        ParameterPoint::new(values[0], values[1])
    }

    /// The parameter values, in the order given by [PARAMETERS]
    pub fn to_array(&self) -> [f64; 2] {
        [self.scout_prob, self.survival_prob]
    }

    /// Round both coordinates to `digits` decimals
    pub fn rounded(&self, digits: u32) -> Self {
        let scale = 10f64.powi(digits as i32);
        ParameterPoint::new(
            (self.scout_prob * scale).round() / scale,
            (self.survival_prob * scale).round() / scale,
        )
    }

    /// Name of the directory holding all results for this point
    ///
    /// Each coordinate is scaled by `10^digits` and rounded to an integer, e.g. `(0.1234, 0.9876)` with four digits
    /// becomes `run_1234_9876`. Two points map to the same name only if they are equal after rounding to `digits` decimals.
    pub fn dir_name(&self, digits: u32) -> String {
        let scale = 10f64.powi(digits as i32);
        format!(
            "run_{}_{}",
            (self.scout_prob * scale).round() as i64,
            (self.survival_prob * scale).round() as i64
        )
    }
}

impl std::fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scout_prob = {:.4}, survival_prob = {:.4}",
            self.scout_prob, self.survival_prob
        )
    }
}

/// The result of comparing the width of one dimension of a region against the original bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shrinkage {
    /// The region lies within the original bounds; the ratio of widths is in `[0, 1]`
    Within(f64),
    /// The region extends beyond the original bounds, the value is the (possibly larger than one) ratio of widths
    Exceeds(f64),
}

impl Shrinkage {
    /// The ratio, if the region stayed within the original bounds
    pub fn ratio(&self) -> Option<f64> {
        match self {
            Shrinkage::Within(ratio) => Some(*ratio),
            Shrinkage::Exceeds(_) => None,
        }
    }
}

/// Axis-aligned bounds of the parameter space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub scout_prob: (f64, f64),
    pub survival_prob: (f64, f64),
}

/// The uninformed bounds of the experiment
pub const ORIG_BOUNDS: Bounds = Bounds {
    scout_prob: (0.0, 0.5),
    survival_prob: (0.95, 1.0),
};

impl Default for Bounds {
    fn default() -> Self {
        ORIG_BOUNDS
    }
}

impl Bounds {
    /// Create new bounds, where the lower bound of each dimension may not exceed the upper bound
    pub fn new(scout_prob: (f64, f64), survival_prob: (f64, f64)) -> Result<Self> {
        Bounds::from_ranges([scout_prob, survival_prob])
    }

    pub fn from_ranges(ranges: [(f64, f64); 2]) -> Result<Self> {
        for (name, (lower, upper)) in PARAMETERS.iter().zip(ranges.iter()) {
            if !lower.is_finite() || !upper.is_finite() {
                bail!("Bounds of '{}' must be finite, got ({}, {})", name, lower, upper);
            }
            if lower > upper {
                bail!(
                    "In '{}', lower bound ({}) is greater than upper bound ({})",
                    name,
                    lower,
                    upper
                );
            }
        }
        Ok(Bounds {
            scout_prob: ranges[0],
            survival_prob: ranges[1],
        })
    }

    /// The bounds as `(lower, upper)` per dimension, in the order given by [PARAMETERS]
    pub fn ranges(&self) -> [(f64, f64); 2] {
        [self.scout_prob, self.survival_prob]
    }

    /// The smallest bounds containing all `points`, or `None` if there are no points
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a ParameterPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut ranges = first.to_array().map(|v| (v, v));
        for point in iter {
            for (range, value) in ranges.iter_mut().zip(point.to_array()) {
                range.0 = range.0.min(value);
                range.1 = range.1.max(value);
            }
        }
        Some(Bounds {
            scout_prob: ranges[0],
            survival_prob: ranges[1],
        })
    }

    pub fn width(&self, dim: usize) -> f64 {
        let (lower, upper) = self.ranges()[dim];
        upper - lower
    }

    pub fn area(&self) -> f64 {
        self.width(0) * self.width(1)
    }

    /// Whether `value` lies within dimension `dim`, bounds included
    pub fn contains_dim(&self, dim: usize, value: f64) -> bool {
        let (lower, upper) = self.ranges()[dim];
        value >= lower && value <= upper
    }

    pub fn contains(&self, point: &ParameterPoint) -> bool {
        point
            .to_array()
            .iter()
            .enumerate()
            .all(|(dim, value)| self.contains_dim(dim, *value))
    }

    /// Ratio of the width of each dimension to the width of the same dimension in `original`
    pub fn shrinkage(&self, original: &Bounds) -> [Shrinkage; 2] {
        let own = self.ranges();
        let orig = original.ranges();
        [0, 1].map(|dim| {
            let ratio = self.width(dim) / original.width(dim);
            let outside = own[dim].0 < orig[dim].0 - BOUND_EPS || own[dim].1 > orig[dim].1 + BOUND_EPS;
            if outside || ratio > 1.0 + BOUND_EPS || !ratio.is_finite() {
                Shrinkage::Exceeds(ratio)
            } else {
                Shrinkage::Within(ratio.min(1.0))
            }
        })
    }

    /// Draw a point uniformly from within the bounds
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterPoint {
        let [scout, survival] = self.ranges().map(|(lower, upper)| rng.gen_range(lower..=upper));
        ParameterPoint::new(scout, survival)
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scout_prob = [{:.4}, {:.4}], survival_prob = [{:.4}, {:.4}]",
            self.scout_prob.0, self.scout_prob.1, self.survival_prob.0, self.survival_prob.1
        )
    }
}
