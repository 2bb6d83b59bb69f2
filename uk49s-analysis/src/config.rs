use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PredictError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub smc_particles: usize,
    pub smc_iterations: usize,
    pub integration_samples: usize,
    pub bootstrap_iterations: usize,
    pub bootstrap_pool: usize,
    pub ga_population: usize,
    pub ga_generations: usize,
    pub ga_mutation_rate: f64,
    /// Tirages pondérés maximum par prédiction (échantillonnage d'importance).
    pub importance_max_draws: usize,
    /// Pas maximum par séquence, redémarrages compris (MCMC).
    pub mcmc_max_steps: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            smc_particles: 100,
            smc_iterations: 5,
            integration_samples: 1000,
            bootstrap_iterations: 1000,
            bootstrap_pool: 20,
            ga_population: 100,
            ga_generations: 100,
            ga_mutation_rate: 0.1,
            importance_max_draws: 10_000,
            mcmc_max_steps: 10_000,
        }
    }
}

impl PredictorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PredictError::config(format!("JSON invalide : {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            PredictError::config(format!("lecture de {} impossible : {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.smc_particles == 0 {
            return Err(PredictError::config("smc_particles doit être > 0"));
        }
        if self.integration_samples == 0 {
            return Err(PredictError::config("integration_samples doit être > 0"));
        }
        if self.bootstrap_iterations == 0 {
            return Err(PredictError::config("bootstrap_iterations doit être > 0"));
        }
        if self.bootstrap_pool < crate::predictors::SET_SIZE {
            return Err(PredictError::config(format!(
                "bootstrap_pool doit être >= {}",
                crate::predictors::SET_SIZE
            )));
        }
        // il faut au moins deux parents distincts (50 % de la population)
        if self.ga_population < 4 {
            return Err(PredictError::config("ga_population doit être >= 4"));
        }
        if !(0.0..=1.0).contains(&self.ga_mutation_rate) {
            return Err(PredictError::config("ga_mutation_rate doit être dans [0, 1]"));
        }
        if self.importance_max_draws == 0 || self.mcmc_max_steps == 0 {
            return Err(PredictError::config("les plafonds d'itérations doivent être > 0"));
        }
        Ok(())
    }
}
