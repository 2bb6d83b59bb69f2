use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictError {
    /// Aucun numéro dans l'historique filtré.
    #[error("distribution vide : aucun tirage dans l'historique filtré")]
    EmptyDistribution,

    #[error("support insuffisant : {required} numéros distincts requis, {available} disponibles")]
    InsufficientSupport { required: usize, available: usize },

    #[error("limite d'itérations atteinte ({limit}) sans compléter la séquence")]
    IterationLimit { limit: usize },

    #[error("nombre de prédictions invalide : {0}")]
    InvalidCount(usize),

    #[error("configuration invalide : {message}")]
    InvalidConfig { message: String },

    #[error("poids d'échantillonnage invalides : {0}")]
    Weights(#[from] rand::distr::weighted::Error),
}

impl PredictError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
