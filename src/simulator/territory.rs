use super::Model;
use crate::routines::settings::Territory;
use crate::structs::observation::OutputTriple;
use crate::structs::parameters::ParameterPoint;
use eyre::{bail, eyre, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution, Poisson};

/// Stochastic model of hoopoes competing for a fixed number of breeding territories
///
/// Every territory is either vacant or held by a breeding pair. Birds without a territory form a pool of floaters.
/// A simulated year consists of
/// 1. breeding: every pair raises a Poisson number of fledglings, which join the floaters if they survive their first year,
/// 2. survival: pairs and floaters survive with `survival_prob`, the territory of a lost pair becomes vacant,
/// 3. scouting: every floater scouts with `scout_prob` and settles if the territory it visits is vacant.
///
/// After the burn-in, the number of occupied territories is recorded every year. The outputs are the mean
/// (abundance) and standard deviation (variation) of the occupied territories, and the mean number of vacant
/// territories (vacancies).
#[derive(Debug, Clone)]
pub struct TerritoryModel {
    settings: Territory,
}

impl TerritoryModel {
    pub fn new(settings: Territory) -> Self {
        TerritoryModel { settings }
    }

    pub fn settings(&self) -> &Territory {
        &self.settings
    }
}

impl Default for TerritoryModel {
    fn default() -> Self {
        TerritoryModel::new(Territory::default())
    }
}

fn binomial<R: Rng>(rng: &mut R, n: u64, p: f64) -> Result<u64> {
    if n == 0 {
        return Ok(0);
    }
    let distribution =
        Binomial::new(n, p).map_err(|e| eyre!("Invalid binomial distribution B({}, {}): {}", n, p, e))?;
    Ok(distribution.sample(rng))
}

fn poisson<R: Rng>(rng: &mut R, lambda: f64) -> Result<u64> {
    if lambda <= 0.0 {
        return Ok(0);
    }
    let distribution =
        Poisson::new(lambda).map_err(|e| eyre!("Invalid Poisson distribution ({}): {}", lambda, e))?;
    let draw: f64 = distribution.sample(rng);
    Ok(draw as u64)
}

impl Model for TerritoryModel {
    fn simulate(&self, point: &ParameterPoint, seed: u64) -> Result<OutputTriple> {
        for (name, value) in [("scout_prob", point.scout_prob), ("survival_prob", point.survival_prob)] {
            if !(0.0..=1.0).contains(&value) {
                bail!("'{}' must be a probability, got {}", name, value);
            }
        }

        let settings = &self.settings;
        let mut rng = StdRng::seed_from_u64(seed);
        let territories = settings.territories as u64;
        let mut occupied = ((territories as f64) * settings.initial_occupancy).round() as u64;
        let mut floaters: u64 = 0;
        let mut series = Vec::with_capacity(settings.years as usize);

        for year in 0..(settings.burn_in + settings.years) {
            let fledglings = poisson(&mut rng, settings.fecundity * occupied as f64)?;
            let recruits = binomial(&mut rng, fledglings, settings.juvenile_survival)?;

            occupied = binomial(&mut rng, occupied, point.survival_prob)?;
            floaters = binomial(&mut rng, floaters, point.survival_prob)? + recruits;

            let scouts = binomial(&mut rng, floaters, point.scout_prob)?;
            let mut vacant = territories - occupied;
            let mut settled = 0;
            for _ in 0..scouts {
                if vacant == 0 {
                    break;
                }
                if rng.gen_range(0..territories) < vacant {
                    vacant -= 1;
                    settled += 1;
                }
            }
            occupied += settled;
            floaters -= settled;

            if year >= settings.burn_in {
                series.push(occupied as f64);
            }
        }

        let n = series.len() as f64;
        let abundance = series.iter().sum::<f64>() / n;
        let variation = if series.len() > 1 {
            (series.iter().map(|x| (x - abundance).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        let vacancies = territories as f64 - abundance;

        Ok(OutputTriple::new(abundance, variation, vacancies))
    }
}
