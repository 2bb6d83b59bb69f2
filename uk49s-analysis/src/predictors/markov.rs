use std::collections::{BTreeMap, BTreeSet};

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::RngExt;

use uk49s_db::models::Draw;

use super::{check_count, Pick, Prediction, Predictor, SET_SIZE};
use crate::error::{PredictError, Result};

/// Chaîne de transitions entre numéros consécutifs d'un tirage trié.
///
/// `transitions[a][b]` = P(b suit a). Pour chaque source les probabilités
/// somment à 1. Les numéros sans successeur (le plus grand de chaque tirage,
/// s'il n'est jamais suivi) n'ont pas d'entrée.
#[derive(Debug, Clone)]
pub struct MarkovChain {
    transitions: BTreeMap<u8, BTreeMap<u8, f64>>,
}

impl MarkovChain {
    pub fn from_draws(draws: &[Draw]) -> Result<Self> {
        let mut counts: BTreeMap<u8, BTreeMap<u8, u32>> = BTreeMap::new();
        for draw in draws {
            let sorted = draw.sorted_numbers();
            for pair in sorted.windows(2) {
                *counts.entry(pair[0]).or_default().entry(pair[1]).or_default() += 1;
            }
        }
        if counts.is_empty() {
            return Err(PredictError::EmptyDistribution);
        }

        let transitions = counts
            .into_iter()
            .map(|(from, next)| {
                let total: u32 = next.values().sum();
                let probs = next
                    .into_iter()
                    .map(|(to, c)| (to, c as f64 / total as f64))
                    .collect();
                (from, probs)
            })
            .collect();
        Ok(Self { transitions })
    }

    pub fn successors(&self, number: u8) -> Option<&BTreeMap<u8, f64>> {
        self.transitions.get(&number)
    }

    pub fn keys(&self) -> Vec<u8> {
        self.transitions.keys().copied().collect()
    }

    /// Numéros atteignables : sources et successeurs confondus.
    pub fn support(&self) -> usize {
        let mut seen: BTreeSet<u8> = self.transitions.keys().copied().collect();
        for next in self.transitions.values() {
            seen.extend(next.keys().copied());
        }
        seen.len()
    }

    /// Marche aléatoire jusqu'à [`SET_SIZE`] numéros distincts. Sur une impasse,
    /// repart d'une source uniforme en gardant la séquence déjà construite.
    pub fn walk(&self, rng: &mut StdRng, max_steps: usize) -> Result<[u8; SET_SIZE]> {
        let keys = self.keys();
        if keys.is_empty() {
            return Err(PredictError::EmptyDistribution);
        }

        let mut current = keys[rng.random_range(0..keys.len())];
        let mut sequence = vec![current];
        let mut steps = 0;
        while sequence.len() < SET_SIZE {
            if steps == max_steps {
                return Err(PredictError::IterationLimit { limit: max_steps });
            }
            steps += 1;

            let Some(next) = self.successors(current) else {
                current = keys[rng.random_range(0..keys.len())];
                continue;
            };
            let numbers: Vec<u8> = next.keys().copied().collect();
            let index = WeightedIndex::new(next.values().copied())?;
            current = numbers[index.sample(rng)];
            if !sequence.contains(&current) {
                sequence.push(current);
            }
        }

        sequence.sort_unstable();
        let mut set = [0u8; SET_SIZE];
        set.copy_from_slice(&sequence);
        Ok(set)
    }
}

pub struct McmcPredictor {
    max_steps: usize,
}

impl McmcPredictor {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }
}

impl Predictor for McmcPredictor {
    fn name(&self) -> &str {
        "MCMC"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        let chain = MarkovChain::from_draws(draws)?;
        let available = chain.support();
        if available < SET_SIZE {
            return Err(PredictError::InsufficientSupport {
                required: SET_SIZE,
                available,
            });
        }
        log::debug!("chaîne : {} sources, {available} numéros", chain.keys().len());

        let picks = (0..count)
            .map(|_| chain.walk(rng, self.max_steps).map(Pick::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Prediction::Picks(picks))
    }
}
