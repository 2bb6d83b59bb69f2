pub mod bootstrap;
pub mod genetic;
pub mod importance;
pub mod integration;
pub mod markov;
pub mod monte_carlo;
pub mod smc;

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::index;

use uk49s_db::models::Draw;

use crate::config::PredictorConfig;
use crate::error::{PredictError, Result};

/// Taille des ensembles prédits.
pub const SET_SIZE: usize = 4;

/// Ensemble trié de [`SET_SIZE`] numéros, avec le score propre à la méthode quand elle en a un.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub numbers: [u8; SET_SIZE],
    pub score: Option<f64>,
}

impl Pick {
    pub fn new(numbers: [u8; SET_SIZE]) -> Self {
        Self { numbers, score: None }
    }

    pub fn scored(numbers: [u8; SET_SIZE], score: f64) -> Self {
        Self { numbers, score: Some(score) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Numéros indépendants, doublons possibles.
    Numbers(Vec<u8>),
    Picks(Vec<Pick>),
}

impl Prediction {
    pub fn len(&self) -> usize {
        match self {
            Prediction::Numbers(numbers) => numbers.len(),
            Prediction::Picks(picks) => picks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `draws` est l'historique déjà filtré par session, du plus récent au plus ancien.
pub trait Predictor {
    fn name(&self) -> &str;
    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    MonteCarlo,
    Importance,
    Mcmc,
    Smc,
    Integration,
    Bootstrap,
    Genetic,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::MonteCarlo,
        Method::Importance,
        Method::Mcmc,
        Method::Smc,
        Method::Integration,
        Method::Bootstrap,
        Method::Genetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::MonteCarlo => "monte-carlo",
            Method::Importance => "importance",
            Method::Mcmc => "mcmc",
            Method::Smc => "smc",
            Method::Integration => "integration",
            Method::Bootstrap => "bootstrap",
            Method::Genetic => "genetic",
        }
    }

    pub fn build(&self, config: &PredictorConfig) -> Box<dyn Predictor> {
        match self {
            Method::MonteCarlo => Box::new(monte_carlo::MonteCarloPredictor),
            Method::Importance => {
                Box::new(importance::ImportancePredictor::new(config.importance_max_draws))
            }
            Method::Mcmc => Box::new(markov::McmcPredictor::new(config.mcmc_max_steps)),
            Method::Smc => Box::new(smc::SmcPredictor::new(
                config.smc_particles,
                config.smc_iterations,
            )),
            Method::Integration => {
                Box::new(integration::IntegrationPredictor::new(config.integration_samples))
            }
            Method::Bootstrap => Box::new(bootstrap::BootstrapPredictor::new(
                config.bootstrap_iterations,
                config.bootstrap_pool,
            )),
            Method::Genetic => Box::new(genetic::GeneticPredictor::new(
                config.ga_population,
                config.ga_generations,
                config.ga_mutation_rate,
            )),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| PredictError::config(format!("méthode inconnue : {s}")))
    }
}

pub fn all_predictors(config: &PredictorConfig) -> Vec<Box<dyn Predictor>> {
    Method::ALL.iter().map(|m| m.build(config)).collect()
}

pub(crate) fn check_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(PredictError::InvalidCount(count));
    }
    Ok(())
}

/// [`SET_SIZE`] numéros distincts tirés uniformément dans `pool`, triés.
/// `pool` doit contenir des valeurs distinctes en nombre suffisant.
pub(crate) fn sample_distinct(pool: &[u8], rng: &mut StdRng) -> Result<[u8; SET_SIZE]> {
    if pool.len() < SET_SIZE {
        return Err(PredictError::InsufficientSupport {
            required: SET_SIZE,
            available: pool.len(),
        });
    }
    let mut set = [0u8; SET_SIZE];
    for (slot, i) in set.iter_mut().zip(index::sample(rng, pool.len(), SET_SIZE)) {
        *slot = pool[i];
    }
    set.sort_unstable();
    Ok(set)
}

/// Regroupe les ensembles identiques ; ordre de première apparition.
pub(crate) fn tally(sets: &[[u8; SET_SIZE]]) -> Vec<([u8; SET_SIZE], usize)> {
    let mut counts: Vec<([u8; SET_SIZE], usize)> = Vec::new();
    for set in sets {
        match counts.iter_mut().find(|(s, _)| s == set) {
            Some((_, c)) => *c += 1,
            None => counts.push((*set, 1)),
        }
    }
    counts
}

#[cfg(test)]
pub(crate) fn assert_valid_set(numbers: &[u8; SET_SIZE]) {
    assert!(numbers.windows(2).all(|w| w[0] < w[1]), "{numbers:?}");
    assert!(numbers.iter().all(|&n| (1..=49).contains(&n)), "{numbers:?}");
}
