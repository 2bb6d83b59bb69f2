use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::RngExt;

use uk49s_db::models::Draw;

use super::{check_count, sample_distinct, tally, Pick, Prediction, Predictor, SET_SIZE};
use crate::distribution::MarginalDistribution;
use crate::error::{PredictError, Result};

/// Filtre particulaire : pondération par vraisemblance marginale, rééchantillonnage
/// puis mutation d'une position par particule, sur un nombre fixe d'itérations.
pub struct SmcPredictor {
    particles: usize,
    iterations: usize,
}

impl SmcPredictor {
    pub fn new(particles: usize, iterations: usize) -> Self {
        Self { particles, iterations }
    }
}

/// Remplace une position au hasard par un numéro du pool absent de la particule.
/// Sans numéro libre, la particule reste inchangée.
fn mutate(particle: &mut [u8; SET_SIZE], pool: &[u8], rng: &mut StdRng) {
    let free: Vec<u8> = pool.iter().copied().filter(|n| !particle.contains(n)).collect();
    if free.is_empty() {
        return;
    }
    let pos = rng.random_range(0..SET_SIZE);
    particle[pos] = free[rng.random_range(0..free.len())];
    particle.sort_unstable();
}

/// Poids normalisés ; uniformes si la somme est nulle.
fn normalized_weights(scores: &[f64]) -> Vec<f64> {
    let total: f64 = scores.iter().sum();
    if total > 0.0 && total.is_finite() {
        scores.iter().map(|s| s / total).collect()
    } else {
        vec![1.0 / scores.len() as f64; scores.len()]
    }
}

impl Predictor for SmcPredictor {
    fn name(&self) -> &str {
        "SMC"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        if self.particles == 0 {
            return Err(PredictError::config("smc_particles doit être > 0"));
        }
        let dist = MarginalDistribution::from_draws(draws)?;
        dist.require_support(SET_SIZE)?;
        let pool = dist.numbers();

        let mut particles = (0..self.particles)
            .map(|_| sample_distinct(&pool, rng))
            .collect::<Result<Vec<_>>>()?;

        for iteration in 0..self.iterations {
            let scores: Vec<f64> = particles.iter().map(|p| dist.likelihood(p)).collect();
            let index = WeightedIndex::new(normalized_weights(&scores))?;

            let mut next: Vec<[u8; SET_SIZE]> =
                (0..self.particles).map(|_| particles[index.sample(rng)]).collect();
            for particle in &mut next {
                mutate(particle, &pool, rng);
            }
            particles = next;

            log::debug!(
                "SMC itération {} : {} particules distinctes",
                iteration + 1,
                tally(&particles).len()
            );
        }

        let mut counts = tally(&particles);
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let picks = counts
            .into_iter()
            .take(count)
            .map(|(set, c)| Pick::scored(set, c as f64 / self.particles as f64))
            .collect();
        Ok(Prediction::Picks(picks))
    }
}
