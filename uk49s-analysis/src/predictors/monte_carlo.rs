use rand::rngs::StdRng;

use uk49s_db::models::Draw;

use super::{check_count, Prediction, Predictor};
use crate::distribution::MarginalDistribution;
use crate::error::Result;

/// Tirages indépendants avec remise, proportionnels aux fréquences observées.
pub struct MonteCarloPredictor;

impl Predictor for MonteCarloPredictor {
    fn name(&self) -> &str {
        "Monte Carlo"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        let sampler = MarginalDistribution::from_draws(draws)?.sampler()?;
        let numbers = (0..count).map(|_| sampler.sample(rng)).collect();
        Ok(Prediction::Numbers(numbers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario_draws;
    use rand::SeedableRng;

    #[test]
    fn test_numbers_in_observed_support() {
        let mut rng = StdRng::seed_from_u64(42);
        let prediction = MonteCarloPredictor.predict(&scenario_draws(), 50, &mut rng).unwrap();
        let Prediction::Numbers(numbers) = prediction else {
            panic!("attendu : numéros");
        };
        assert_eq!(numbers.len(), 50);
        assert!(numbers.iter().all(|n| (1..=8).contains(n)));
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let draws = scenario_draws();
        let a = MonteCarloPredictor.predict(&draws, 10, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = MonteCarloPredictor.predict(&draws, 10, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frequent_numbers_dominate() {
        // 1..6 pèsent 2/14, 7 et 8 pèsent 1/14
        let mut rng = StdRng::seed_from_u64(11);
        let Prediction::Numbers(numbers) =
            MonteCarloPredictor.predict(&scenario_draws(), 7000, &mut rng).unwrap()
        else {
            panic!("attendu : numéros");
        };
        let ones = numbers.iter().filter(|&&n| n == 1).count();
        let sevens = numbers.iter().filter(|&&n| n == 7).count();
        assert!(ones > sevens);
    }
}
