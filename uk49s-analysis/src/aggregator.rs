//! Agrégation des extrêmes du moteur de fréquences en un pool de numéros candidats.
//!
//! Chaque combinaison (fenêtre, dimension, session, sens) produit un échantillon
//! étiqueté de [`SLICE_SIZE`] numéros. Les échantillons sont rangés dans une seule
//! [`SampleCollection`] ; les pools par session les concatènent sans dédoublonner,
//! si bien qu'un numéro présent dans plusieurs échantillons y pèse plusieurs fois.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use uk49s_db::models::Draw;

use crate::cooccurrence::{companions, COMPANION_COUNT};
use crate::frequency::{
    bottom_n, filter_draws, top_n, ConditionalMatrix, FrequencyTable, GroupKey, Grouping, Recency,
    SessionScope,
};

pub const SLICE_SIZE: usize = 6;
pub const SEED_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Frequency,
    DayOfMonth,
    DayOfWeek,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Frequency, Dimension::DayOfMonth, Dimension::DayOfWeek];

    fn grouping(&self) -> Option<Grouping> {
        match self {
            Dimension::Frequency => None,
            Dimension::DayOfMonth => Some(Grouping::DayOfMonth),
            Dimension::DayOfWeek => Some(Grouping::DayOfWeek),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Top,
    Bottom,
}

/// Clé d'un échantillon. L'ordre des champs fixe l'ordre de concaténation des pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleKey {
    pub recency: Recency,
    pub dimension: Dimension,
    pub scope: SessionScope,
    pub direction: Direction,
}

impl fmt::Display for SampleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.recency.label())?;
        match self.dimension {
            Dimension::Frequency => {}
            Dimension::DayOfMonth => write!(f, "_date")?,
            Dimension::DayOfWeek => write!(f, "_day")?,
        }
        match self.direction {
            Direction::Top => write!(f, "_top")?,
            Direction::Bottom => write!(f, "_bottom")?,
        }
        if let Some(session) = self.scope.session() {
            write!(f, "_{session}")?;
        }
        write!(f, "_sample")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub number: u8,
    pub probability: f64,
    pub source: SampleKey,
}

#[derive(Debug, Clone)]
pub struct SampleCollection {
    target: NaiveDate,
    samples: BTreeMap<SampleKey, Vec<Candidate>>,
}

impl SampleCollection {
    /// `target` sert de référence à la fenêtre récente et fixe le jour du mois
    /// et le jour de la semaine des dimensions conditionnelles.
    pub fn build(draws: &[Draw], target: NaiveDate) -> Self {
        let mut samples = BTreeMap::new();

        for recency in Recency::ALL {
            for scope in SessionScope::ALL {
                let subset = filter_draws(draws, scope, recency, target);
                log::debug!("{} / {} : {} tirages", recency.label(), scope, subset.len());

                let table = FrequencyTable::from_draws(&subset);
                for dimension in Dimension::ALL {
                    let entries: Vec<(u8, f64)> = match dimension.grouping() {
                        None => table
                            .encounter_order()
                            .iter()
                            .map(|&n| (n, table.recurrence_probability(n)))
                            .collect(),
                        Some(grouping) => ConditionalMatrix::from_draws(&subset, grouping)
                            .column(&GroupKey::of(grouping, target)),
                    };

                    for (direction, slice) in [
                        (Direction::Top, top_n(&entries, SLICE_SIZE)),
                        (Direction::Bottom, bottom_n(&entries, SLICE_SIZE)),
                    ] {
                        let source = SampleKey { recency, dimension, scope, direction };
                        let tagged = slice
                            .into_iter()
                            .map(|(number, probability)| Candidate { number, probability, source })
                            .collect();
                        samples.insert(source, tagged);
                    }
                }
            }
        }

        Self { target, samples }
    }

    pub fn target(&self) -> NaiveDate {
        self.target
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, key: &SampleKey) -> Option<&[Candidate]> {
        self.samples.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SampleKey, &[Candidate])> + '_ {
        self.samples.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Pool d'une session : échantillons combinés + ceux de la session.
    /// Le pool combiné contient tout.
    pub fn pool(&self, scope: SessionScope) -> Vec<Candidate> {
        self.samples
            .iter()
            .filter(|(key, _)| {
                scope == SessionScope::Combined
                    || key.scope == SessionScope::Combined
                    || key.scope == scope
            })
            .flat_map(|(_, candidates)| candidates.iter().copied())
            .collect()
    }
}

/// Les `limit` numéros les plus récurrents du pool, toutes étiquettes confondues.
/// À égalité, le premier rencontré dans le pool passe devant.
pub fn top_numbers(pool: &[Candidate], limit: usize) -> Vec<(u8, usize)> {
    let mut counts: Vec<(u8, usize)> = Vec::new();
    for candidate in pool {
        match counts.iter_mut().find(|(n, _)| *n == candidate.number) {
            Some((_, c)) => *c += 1,
            None => counts.push((candidate.number, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaySuggestion {
    pub seed: u8,
    pub hits: usize,
    pub companions: Vec<(u8, u32)>,
}

impl PlaySuggestion {
    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.companions.iter().map(move |&(c, _)| (self.seed, c))
    }
}

/// Graines du pool de `scope`, chacune accompagnée de ses compagnons sur tout l'historique.
pub fn play_suggestions(
    collection: &SampleCollection,
    history: &[Draw],
    scope: SessionScope,
) -> Vec<PlaySuggestion> {
    top_numbers(&collection.pool(scope), SEED_COUNT)
        .into_iter()
        .map(|(seed, hits)| PlaySuggestion {
            seed,
            hits,
            companions: companions(history, seed, COMPANION_COUNT),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberTrace {
    pub number: u8,
    pub hits: usize,
    pub sources: Vec<SampleKey>,
}

/// Pour chaque numéro joué, les échantillons du pool qui le contiennent.
pub fn trace_numbers(pool: &[Candidate], numbers: &[u8]) -> Vec<NumberTrace> {
    numbers
        .iter()
        .map(|&number| {
            let sources: Vec<SampleKey> = pool
                .iter()
                .filter(|c| c.number == number)
                .map(|c| c.source)
                .collect();
            NumberTrace {
                number,
                hits: sources.len(),
                sources,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make_test_draws;

    fn collection(n: usize) -> (Vec<Draw>, SampleCollection) {
        let draws = make_test_draws(n);
        let target = draws[0].date;
        let collection = SampleCollection::build(&draws, target);
        (draws, collection)
    }

    #[test]
    fn test_thirty_six_samples() {
        let (_, collection) = collection(200);
        assert_eq!(collection.len(), 36);
        for (key, candidates) in collection.iter() {
            assert_eq!(candidates.len(), SLICE_SIZE, "{key}");
            assert!(candidates.iter().all(|c| c.source == *key));
            assert!(candidates.iter().all(|c| (0.0..=1.0).contains(&c.probability)));
        }
    }

    #[test]
    fn test_sample_labels() {
        let key = SampleKey {
            recency: Recency::AllTime,
            dimension: Dimension::Frequency,
            scope: SessionScope::Combined,
            direction: Direction::Top,
        };
        assert_eq!(key.to_string(), "all_top_sample");

        let key = SampleKey {
            recency: Recency::Last49,
            dimension: Dimension::DayOfMonth,
            scope: SessionScope::Teatime,
            direction: Direction::Bottom,
        };
        assert_eq!(key.to_string(), "last49_date_bottom_teatime_sample");
    }

    #[test]
    fn test_top_slice_is_highest_probability() {
        let (_, collection) = collection(200);
        let key = SampleKey {
            recency: Recency::AllTime,
            dimension: Dimension::Frequency,
            scope: SessionScope::Combined,
            direction: Direction::Top,
        };
        let top = collection.get(&key).unwrap();
        let bottom_key = SampleKey { direction: Direction::Bottom, ..key };
        let bottom = collection.get(&bottom_key).unwrap();
        let min_top = top.iter().map(|c| c.probability).fold(f64::INFINITY, f64::min);
        let max_bottom = bottom.iter().map(|c| c.probability).fold(0.0, f64::max);
        assert!(min_top >= max_bottom);
    }

    #[test]
    fn test_session_pools_exclude_other_session() {
        let (_, collection) = collection(200);
        let lunch = collection.pool(SessionScope::Lunchtime);
        let tea = collection.pool(SessionScope::Teatime);
        let all = collection.pool(SessionScope::Combined);

        assert!(lunch.iter().all(|c| c.source.scope != SessionScope::Teatime));
        assert!(tea.iter().all(|c| c.source.scope != SessionScope::Lunchtime));
        // 24 échantillons par session, 36 au total
        assert_eq!(lunch.len(), 24 * SLICE_SIZE);
        assert_eq!(tea.len(), 24 * SLICE_SIZE);
        assert_eq!(all.len(), 36 * SLICE_SIZE);
    }

    #[test]
    fn test_top_numbers_counts_across_tags() {
        let key = SampleKey {
            recency: Recency::AllTime,
            dimension: Dimension::Frequency,
            scope: SessionScope::Combined,
            direction: Direction::Top,
        };
        let pool: Vec<Candidate> = [5u8, 3, 5, 9, 3, 5]
            .iter()
            .map(|&number| Candidate { number, probability: 0.1, source: key })
            .collect();
        assert_eq!(top_numbers(&pool, 2), vec![(5, 3), (3, 2)]);
        assert_eq!(top_numbers(&pool, 7).len(), 3);
    }

    #[test]
    fn test_top_numbers_ties_keep_pool_order() {
        let key = SampleKey {
            recency: Recency::Last49,
            dimension: Dimension::Frequency,
            scope: SessionScope::Lunchtime,
            direction: Direction::Bottom,
        };
        let pool: Vec<Candidate> = [9u8, 4, 4, 9, 2, 7]
            .iter()
            .map(|&number| Candidate { number, probability: 0.1, source: key })
            .collect();
        assert_eq!(top_numbers(&pool, 3), vec![(9, 2), (4, 2), (2, 1)]);
        assert_eq!(top_numbers(&pool, 4)[3], (7, 1));
    }

    #[test]
    fn test_play_suggestions_shape() {
        let (draws, collection) = collection(200);
        for scope in [SessionScope::Lunchtime, SessionScope::Teatime] {
            let suggestions = play_suggestions(&collection, &draws, scope);
            assert_eq!(suggestions.len(), SEED_COUNT);
            for s in &suggestions {
                assert_eq!(s.companions.len(), COMPANION_COUNT);
                assert!(s.companions.iter().all(|&(c, _)| c != s.seed));
                assert_eq!(s.pairs().count(), COMPANION_COUNT);
                assert!(s.pairs().all(|(seed, _)| seed == s.seed));
            }
            assert!(suggestions.windows(2).all(|w| w[0].hits >= w[1].hits));
        }
    }

    #[test]
    fn test_trace_numbers() {
        let (_, collection) = collection(200);
        let pool = collection.pool(SessionScope::Combined);
        let seed = pool[0].number;
        let traces = trace_numbers(&pool, &[seed, 200]);
        assert!(traces[0].hits >= 1);
        assert_eq!(traces[0].hits, traces[0].sources.len());
        assert_eq!(traces[1].hits, 0);
    }

    #[test]
    fn test_empty_history_gives_empty_samples() {
        let target = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let collection = SampleCollection::build(&[], target);
        assert_eq!(collection.len(), 36);
        assert!(collection.pool(SessionScope::Combined).is_empty());
    }
}
