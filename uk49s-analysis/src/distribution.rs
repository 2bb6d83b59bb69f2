use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;

use uk49s_db::models::{Draw, MAX_NUMBER};

use crate::error::{PredictError, Result};
use crate::frequency::FrequencyTable;

/// Score attribué à un numéro absent de l'historique, pour ne jamais annuler un poids.
pub const LIKELIHOOD_FLOOR: f64 = 0.0001;

/// Fréquence marginale de chaque numéro observé : effectif / total des numéros tirés.
/// Les probabilités somment à 1 sur le support.
#[derive(Debug, Clone)]
pub struct MarginalDistribution {
    entries: Vec<(u8, f64)>,
    lookup: [f64; MAX_NUMBER as usize + 1],
}

impl MarginalDistribution {
    pub fn from_draws(draws: &[Draw]) -> Result<Self> {
        let table = FrequencyTable::from_draws(draws);
        let total = table.total();
        if table.is_empty() || total == 0 {
            return Err(PredictError::EmptyDistribution);
        }

        let mut lookup = [0.0f64; MAX_NUMBER as usize + 1];
        let entries: Vec<(u8, f64)> = table
            .encounter_order()
            .iter()
            .map(|&n| {
                let p = table.count(n) as f64 / total as f64;
                lookup[n as usize] = p;
                (n, p)
            })
            .collect();

        Ok(Self { entries, lookup })
    }

    pub fn entries(&self) -> &[(u8, f64)] {
        &self.entries
    }

    pub fn numbers(&self) -> Vec<u8> {
        self.entries.iter().map(|&(n, _)| n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nombre de numéros de poids non nul.
    pub fn support(&self) -> usize {
        self.entries.iter().filter(|&&(_, p)| p > 0.0).count()
    }

    pub fn require_support(&self, required: usize) -> Result<()> {
        let available = self.support();
        if available < required {
            return Err(PredictError::InsufficientSupport { required, available });
        }
        Ok(())
    }

    pub fn probability(&self, number: u8) -> Option<f64> {
        match self.lookup.get(number as usize) {
            Some(&p) if p > 0.0 => Some(p),
            _ => None,
        }
    }

    /// Vraisemblance d'une séquence : somme des fréquences marginales (plancher pour les absents).
    pub fn likelihood(&self, sequence: &[u8]) -> f64 {
        sequence
            .iter()
            .map(|&n| self.probability(n).unwrap_or(LIKELIHOOD_FLOOR))
            .sum()
    }

    pub fn sampler(&self) -> Result<WeightedSampler> {
        let weights: Vec<f64> = self.entries.iter().map(|&(_, p)| p).collect();
        let index = WeightedIndex::new(&weights)?;
        Ok(WeightedSampler {
            numbers: self.numbers(),
            index,
        })
    }
}

/// Tirage pondéré d'un numéro, avec remise.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    numbers: Vec<u8>,
    index: WeightedIndex<f64>,
}

impl WeightedSampler {
    pub fn sample(&self, rng: &mut StdRng) -> u8 {
        self.numbers[self.index.sample(rng)]
    }
}
