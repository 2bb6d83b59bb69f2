use std::collections::BTreeSet;

use rand::rngs::StdRng;

use uk49s_db::models::Draw;

use super::{check_count, Pick, Prediction, Predictor, SET_SIZE};
use crate::distribution::MarginalDistribution;
use crate::error::{PredictError, Result};

/// Accumule des tirages pondérés jusqu'à obtenir [`SET_SIZE`] numéros distincts.
pub struct ImportancePredictor {
    max_draws: usize,
}

impl ImportancePredictor {
    pub fn new(max_draws: usize) -> Self {
        Self { max_draws }
    }
}

impl Predictor for ImportancePredictor {
    fn name(&self) -> &str {
        "Importance"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        let dist = MarginalDistribution::from_draws(draws)?;
        dist.require_support(SET_SIZE)?;
        let sampler = dist.sampler()?;

        let mut picks = Vec::with_capacity(count);
        for _ in 0..count {
            let mut set = BTreeSet::new();
            let mut attempts = 0;
            while set.len() < SET_SIZE {
                if attempts == self.max_draws {
                    return Err(PredictError::IterationLimit { limit: self.max_draws });
                }
                attempts += 1;
                set.insert(sampler.sample(rng));
            }
            log::debug!("importance : {attempts} tirages pour {set:?}");

            let mut numbers = [0u8; SET_SIZE];
            for (slot, n) in numbers.iter_mut().zip(set) {
                *slot = n;
            }
            picks.push(Pick::new(numbers));
        }
        Ok(Prediction::Picks(picks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictors::assert_valid_set;
    use crate::scenario_draws;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use uk49s_db::models::Session;

    #[test]
    fn test_sets_are_distinct_and_in_support() {
        let mut rng = StdRng::seed_from_u64(42);
        let Prediction::Picks(picks) = ImportancePredictor::new(10_000)
            .predict(&scenario_draws(), 20, &mut rng)
            .unwrap()
        else {
            panic!("attendu : ensembles");
        };
        assert_eq!(picks.len(), 20);
        for pick in &picks {
            assert_valid_set(&pick.numbers);
            assert!(pick.numbers.iter().all(|n| (1..=8).contains(n)));
        }
    }

    #[test]
    fn test_insufficient_support() {
        // tirage dégénéré : 3 numéros distincts seulement
        let draws = vec![Draw {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            session: Session::Teatime,
            numbers: [1, 2, 3, 1, 2, 3, 1],
        }];
        let mut rng = StdRng::seed_from_u64(1);
        let err = ImportancePredictor::new(100).predict(&draws, 1, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PredictError::InsufficientSupport { required: 4, available: 3 }
        ));
    }

    #[test]
    fn test_attempt_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = ImportancePredictor::new(3).predict(&scenario_draws(), 1, &mut rng).unwrap_err();
        assert!(matches!(err, PredictError::IterationLimit { limit: 3 }));
    }
}
