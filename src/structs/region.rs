use serde::{Deserialize, Serialize};

use super::parameters::{Bounds, ParameterPoint};

/// An ordered set of accepted parameter points
///
/// Implemented by the outcome of a history matching wave and by an ABC rejection run.
pub trait AcceptedRegion {
    fn points(&self) -> Vec<ParameterPoint>;

    fn len(&self) -> usize {
        self.points().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Axis-aligned bounds of the accepted points, `None` for an empty region
    fn bounds(&self) -> Option<Bounds> {
        Bounds::of_points(&self.points())
    }
}

/// A non-implausible point of a history matching wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavePoint {
    pub point: ParameterPoint,
    pub weight: f64,
    /// The maximum implausibility over all outputs
    pub implausibility: f64,
}

/// The non-implausible space found by one history matching wave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Wave number, starting at 1
    pub wave: usize,
    /// Bounds the candidates of this wave were drawn from
    pub bounds: Bounds,
    /// Number of candidate points evaluated
    pub candidates: usize,
    /// Number of simulator runs spent on this wave
    pub simulator_runs: u64,
    pub points: Vec<WavePoint>,
}

impl AcceptedRegion for Wave {
    fn points(&self) -> Vec<ParameterPoint> {
        self.points.iter().map(|p| p.point).collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Distinguishes the two ABC rejection runs performed for every sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Prior bounded by the history matching result
    Informed,
    /// Prior equal to the original bounds
    Uninformed,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Informed, Variant::Uninformed];

    /// File suffix of the persisted results
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Informed => "_hm",
            Variant::Uninformed => "",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Informed => write!(f, "informed"),
            Variant::Uninformed => write!(f, "uninformed"),
        }
    }
}

/// A point accepted by ABC rejection sampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbcPoint {
    pub point: ParameterPoint,
    /// Number of simulator runs since the previous acceptance, including the one accepting this point
    pub attempts: u64,
    pub distance: f64,
}

/// The result of one ABC rejection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcRun {
    pub variant: Variant,
    pub prior: Bounds,
    pub threshold: f64,
    pub points: Vec<AbcPoint>,
}

impl AbcRun {
    /// Total number of simulator runs spent, accepted or not
    pub fn total_runs(&self) -> u64 {
        self.points.iter().map(|p| p.attempts).sum()
    }
}

impl AcceptedRegion for AbcRun {
    fn points(&self) -> Vec<ParameterPoint> {
        self.points.iter().map(|p| p.point).collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc_total_runs() {
        let run = AbcRun {
            variant: Variant::Informed,
            prior: Bounds::default(),
            threshold: 1.0,
            points: vec![
                AbcPoint {
                    point: ParameterPoint::new(0.1, 0.96),
                    attempts: 4,
                    distance: 0.5,
                },
                AbcPoint {
                    point: ParameterPoint::new(0.2, 0.98),
                    attempts: 11,
                    distance: 0.0,
                },
            ],
        };
        assert_eq!(run.total_runs(), 15);
        assert_eq!(run.len(), 2);
        let bounds = run.bounds().unwrap();
        assert_eq!(bounds.scout_prob, (0.1, 0.2));
    }

    #[test]
    fn test_empty_wave_has_no_bounds() {
        let wave = Wave {
            wave: 1,
            bounds: Bounds::default(),
            candidates: 16,
            simulator_runs: 160,
            points: vec![],
        };
        assert!(wave.is_empty());
        assert!(wave.bounds().is_none());
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(Variant::Informed.suffix(), "_hm");
        assert_eq!(Variant::Uninformed.suffix(), "");
    }
}
