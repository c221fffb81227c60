use crate::routines::settings::Simulator;
use crate::structs::observation::OutputTriple;
use crate::structs::parameters::ParameterPoint;
use eyre::Result;
use rayon::prelude::*;

pub mod command;
pub mod territory;

pub use command::CommandModel;
pub use territory::TerritoryModel;

/// A stochastic simulator of the hoopoe population
///
/// Implementations must be deterministic for a given `seed`: the experiment relies on this to reproduce observations
/// and to make results independent of the order in which parallel runs are scheduled.
pub trait Model: Sync {
    /// Run the model once
    fn simulate(&self, point: &ParameterPoint, seed: u64) -> Result<OutputTriple>;

    /// Run `repetitions` independent replications of the model
    ///
    /// Replication `r` is seeded with `derive_seed(seed, r)`, and the replications are returned in order.
    fn run_ensemble(
        &self,
        point: &ParameterPoint,
        repetitions: usize,
        seed: u64,
    ) -> Result<Vec<OutputTriple>> {
        (0..repetitions)
            .into_par_iter()
            .map(|r| self.simulate(point, derive_seed(seed, r as u64)))
            .collect()
    }
}

impl<M: Model + ?Sized> Model for &M {
    fn simulate(&self, point: &ParameterPoint, seed: u64) -> Result<OutputTriple> {
        (**self).simulate(point, seed)
    }
}

/// Derive an independent seed for stream `stream` from `seed`
///
/// Uses the SplitMix64 finalizer, so that neighbouring streams yield unrelated seeds.
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed
        .wrapping_add(stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The simulator selected in the [Settings](crate::routines::settings::Settings)
#[derive(Debug, Clone)]
pub enum Engine {
    Territory(TerritoryModel),
    Command(CommandModel),
}

impl Engine {
    pub fn new(settings: &Simulator) -> Result<Self> {
        settings.validate()?;
        let engine = match settings {
            Simulator::Territory(territory) => Engine::Territory(TerritoryModel::new(territory.clone())),
            Simulator::Command(command) => Engine::Command(CommandModel::new(command.clone())),
        };
        Ok(engine)
    }
}

impl Model for Engine {
    fn simulate(&self, point: &ParameterPoint, seed: u64) -> Result<OutputTriple> {
        match self {
            Engine::Territory(model) => model.simulate(point, seed),
            Engine::Command(model) => model.simulate(point, seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derive_seed() {
        assert_eq!(derive_seed(1, 0), derive_seed(1, 0));
        let seeds: HashSet<u64> = (0..1000).map(|s| derive_seed(1, s)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(derive_seed(1, 0), derive_seed(2, 0));
    }

    #[test]
    fn test_ensemble_is_reproducible() {
        let engine = Engine::new(&Simulator::default()).unwrap();
        let point = ParameterPoint::new(0.25, 0.975);
        let first = engine.run_ensemble(&point, 8, 42).unwrap();
        let second = engine.run_ensemble(&point, 8, 42).unwrap();
        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
        assert_eq!(first[3], engine.simulate(&point, derive_seed(42, 3)).unwrap());
    }
}
