use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_NUMBER: u8 = 49;
pub const NUMBERS_PER_DRAW: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Lunchtime,
    Teatime,
}

impl Session {
    pub const ALL: [Session; 2] = [Session::Lunchtime, Session::Teatime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Lunchtime => "lunchtime",
            Session::Teatime => "teatime",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session inconnue : '{0}' (attendu lunchtime ou teatime)")]
pub struct UnknownSession(pub String);

impl FromStr for Session {
    type Err = UnknownSession;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lunchtime" => Ok(Session::Lunchtime),
            "teatime" => Ok(Session::Teatime),
            other => Err(UnknownSession(other.to_string())),
        }
    }
}

/// Un tirage UK 49s. `numbers` garde l'ordre de sortie publié (le 7e est le bonus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Draw {
    pub date: NaiveDate,
    #[serde(rename = "time")]
    pub session: Session,
    pub numbers: [u8; NUMBERS_PER_DRAW],
}

impl Draw {
    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    pub fn sorted_numbers(&self) -> [u8; NUMBERS_PER_DRAW] {
        let mut sorted = self.numbers;
        sorted.sort_unstable();
        sorted
    }

    /// Bitset des numéros : bit `n` positionné si `n` est sorti.
    pub fn mask(&self) -> u64 {
        number_mask(&self.numbers)
    }
}

/// Les valeurs hors de 0..64 sont ignorées.
pub fn number_mask(numbers: &[u8]) -> u64 {
    numbers
        .iter()
        .fold(0u64, |acc, &n| acc | 1u64.checked_shl(n as u32).unwrap_or(0))
}

pub fn validate_numbers(numbers: &[u8; NUMBERS_PER_DRAW]) -> Result<()> {
    for &n in numbers {
        if n < 1 || n > MAX_NUMBER {
            bail!("Numéro {} hors limites (1-{})", n, MAX_NUMBER);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}

/// Ordre canonique : date décroissante, puis teatime avant lunchtime pour un même jour.
pub fn canonical_order(a: &Draw, b: &Draw) -> std::cmp::Ordering {
    (b.date, b.session).cmp(&(a.date, a.session))
}
