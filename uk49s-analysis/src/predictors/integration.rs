use std::collections::HashMap;

use rand::rngs::StdRng;

use uk49s_db::models::Draw;

use super::{check_count, sample_distinct, Pick, Prediction, Predictor, SET_SIZE};
use crate::distribution::MarginalDistribution;
use crate::error::Result;

/// Combinaisons uniformes du pool observé, classées par vraisemblance marginale.
pub struct IntegrationPredictor {
    samples: usize,
}

impl IntegrationPredictor {
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }
}

impl Predictor for IntegrationPredictor {
    fn name(&self) -> &str {
        "Intégration MC"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        let dist = MarginalDistribution::from_draws(draws)?;
        dist.require_support(SET_SIZE)?;
        let pool = dist.numbers();

        // un doublon écrase le score mais garde sa position d'insertion
        let mut scored: Vec<([u8; SET_SIZE], f64)> = Vec::new();
        let mut position: HashMap<[u8; SET_SIZE], usize> = HashMap::new();
        for _ in 0..self.samples {
            let set = sample_distinct(&pool, rng)?;
            let score = dist.likelihood(&set);
            match position.get(&set) {
                Some(&i) => scored[i].1 = score,
                None => {
                    position.insert(set, scored.len());
                    scored.push((set, score));
                }
            }
        }
        log::debug!("intégration : {} combinaisons distinctes sur {}", scored.len(), self.samples);

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let picks = scored
            .into_iter()
            .take(count)
            .map(|(set, score)| Pick::scored(set, score))
            .collect();
        Ok(Prediction::Picks(picks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictors::assert_valid_set;
    use crate::scenario_draws;
    use rand::SeedableRng;

    #[test]
    fn test_best_combination_found() {
        // C(8,4) = 70 combinaisons ; 1000 tirages les couvrent toutes
        let mut rng = StdRng::seed_from_u64(42);
        let Prediction::Picks(picks) = IntegrationPredictor::new(1000)
            .predict(&scenario_draws(), 3, &mut rng)
            .unwrap()
        else {
            panic!("attendu : ensembles");
        };
        assert_eq!(picks.len(), 3);
        for pick in &picks {
            assert_valid_set(&pick.numbers);
            assert!(pick.numbers.iter().all(|&n| n <= 6));
            assert!((pick.score.unwrap() - 8.0 / 14.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_results_are_unique_and_ranked() {
        let mut rng = StdRng::seed_from_u64(1);
        let Prediction::Picks(picks) = IntegrationPredictor::new(500)
            .predict(&crate::make_test_draws(40), 20, &mut rng)
            .unwrap()
        else {
            panic!("attendu : ensembles");
        };
        let scores: Vec<f64> = picks.iter().map(|p| p.score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        for (i, a) in picks.iter().enumerate() {
            assert!(picks[i + 1..].iter().all(|b| b.numbers != a.numbers));
        }
    }

    #[test]
    fn test_fewer_distinct_than_requested() {
        let mut rng = StdRng::seed_from_u64(1);
        let prediction = IntegrationPredictor::new(5)
            .predict(&scenario_draws(), 50, &mut rng)
            .unwrap();
        assert!(prediction.len() <= 5);
    }
}
