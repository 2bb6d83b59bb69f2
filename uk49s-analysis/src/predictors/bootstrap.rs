use rand::rngs::StdRng;
use rand::RngExt;

use uk49s_db::models::Draw;

use super::{check_count, sample_distinct, Pick, Prediction, Predictor, SET_SIZE};
use crate::error::{PredictError, Result};
use crate::frequency::FrequencyTable;

/// Rééchantillonne l'historique, puis tire uniformément parmi les numéros
/// les plus fréquents de l'échantillon.
pub struct BootstrapPredictor {
    iterations: usize,
    pool_size: usize,
}

impl BootstrapPredictor {
    pub fn new(iterations: usize, pool_size: usize) -> Self {
        Self { iterations, pool_size }
    }

    /// `pool_size` numéros les plus fréquents d'un rééchantillon de `iterations` tirages.
    pub fn resampled_pool(&self, draws: &[Draw], rng: &mut StdRng) -> Result<Vec<u8>> {
        if draws.is_empty() {
            return Err(PredictError::EmptyDistribution);
        }
        let resample: Vec<Draw> = (0..self.iterations)
            .map(|_| draws[rng.random_range(0..draws.len())])
            .collect();

        let pool: Vec<u8> = FrequencyTable::from_draws(&resample)
            .ranked()
            .into_iter()
            .take(self.pool_size)
            .map(|(n, _)| n)
            .collect();
        if pool.len() < SET_SIZE {
            return Err(PredictError::InsufficientSupport {
                required: SET_SIZE,
                available: pool.len(),
            });
        }
        Ok(pool)
    }
}

impl Predictor for BootstrapPredictor {
    fn name(&self) -> &str {
        "Bootstrap"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        let pool = self.resampled_pool(draws, rng)?;
        log::debug!("bootstrap : pool restreint {pool:?}");

        let picks = (0..count)
            .map(|_| sample_distinct(&pool, rng).map(Pick::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Prediction::Picks(picks))
    }
}
