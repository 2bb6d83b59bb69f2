use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::RngExt;

use uk49s_db::models::{number_mask, Draw, MAX_NUMBER};

use super::{check_count, Pick, Prediction, Predictor, SET_SIZE};
use crate::error::{PredictError, Result};
use crate::frequency::FrequencyTable;

type Individual = [u8; SET_SIZE];

/// Algorithme génétique sur des ensembles de numéros distincts.
/// Fitness = nombre de tirages contenant tous les numéros de l'individu.
pub struct GeneticPredictor {
    population: usize,
    generations: usize,
    mutation_rate: f64,
}

impl GeneticPredictor {
    pub fn new(population: usize, generations: usize, mutation_rate: f64) -> Self {
        Self {
            population,
            generations,
            mutation_rate,
        }
    }
}

/// Ne dépend pas de l'ordre des numéros ; toujours <= nombre de tirages.
pub fn fitness(individual: &[u8], draw_masks: &[u64]) -> usize {
    let mask = number_mask(individual);
    draw_masks.iter().filter(|&&m| m & mask == mask).count()
}

/// Individu initial : tirage sans remise dans le multiensemble des numéros
/// historiques, chaque valeur pesant son effectif.
fn random_individual(weighted: &[(u8, f64)], rng: &mut StdRng) -> Result<Individual> {
    let mut remaining = weighted.to_vec();
    let mut individual = [0u8; SET_SIZE];
    for slot in individual.iter_mut() {
        let index = WeightedIndex::new(remaining.iter().map(|&(_, w)| w))?;
        *slot = remaining.swap_remove(index.sample(rng)).0;
    }
    individual.sort_unstable();
    Ok(individual)
}

/// Un numéro de 1..=49 absent de `taken`.
fn random_unused(taken: &[u8], rng: &mut StdRng) -> u8 {
    let free: Vec<u8> = (1..=MAX_NUMBER).filter(|n| !taken.contains(n)).collect();
    free[rng.random_range(0..free.len())]
}

/// Coupe unique dans [1, 3] ; les doublons issus de la coupe sont remplacés
/// par des numéros inutilisés.
fn crossover(a: &Individual, b: &Individual, rng: &mut StdRng) -> Individual {
    let cut = rng.random_range(1..SET_SIZE);
    let mut child = *a;
    child[cut..].copy_from_slice(&b[cut..]);
    for i in cut..SET_SIZE {
        if child[..i].contains(&child[i]) {
            child[i] = random_unused(&child, rng);
        }
    }
    child.sort_unstable();
    child
}

fn mutate(individual: &mut Individual, rng: &mut StdRng) {
    let pos = rng.random_range(0..SET_SIZE);
    individual[pos] = random_unused(individual, rng);
    individual.sort_unstable();
}

fn rank(population: Vec<Individual>, draw_masks: &[u64]) -> Vec<(Individual, usize)> {
    let mut scored: Vec<(Individual, usize)> = population
        .into_iter()
        .map(|ind| {
            let f = fitness(&ind, draw_masks);
            (ind, f)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

impl Predictor for GeneticPredictor {
    fn name(&self) -> &str {
        "Génétique"
    }

    fn predict(&self, draws: &[Draw], count: usize, rng: &mut StdRng) -> Result<Prediction> {
        check_count(count)?;
        let n_parents = self.population / 2;
        if n_parents < 2 {
            return Err(PredictError::config("ga_population doit être >= 4"));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(PredictError::config("ga_mutation_rate doit être dans [0, 1]"));
        }

        let table = FrequencyTable::from_draws(draws);
        if table.is_empty() {
            return Err(PredictError::EmptyDistribution);
        }
        let weighted: Vec<(u8, f64)> = table
            .encounter_order()
            .iter()
            .map(|&n| (n, table.count(n) as f64))
            .collect();
        if weighted.len() < SET_SIZE {
            return Err(PredictError::InsufficientSupport {
                required: SET_SIZE,
                available: weighted.len(),
            });
        }
        let draw_masks: Vec<u64> = draws.iter().map(Draw::mask).collect();

        let mut population = (0..self.population)
            .map(|_| random_individual(&weighted, rng))
            .collect::<Result<Vec<_>>>()?;

        for generation in 0..self.generations {
            let ranked = rank(population, &draw_masks);
            log::debug!(
                "génération {} : meilleure fitness {}",
                generation + 1,
                ranked.first().map_or(0, |(_, f)| *f)
            );
            let parents: Vec<Individual> =
                ranked.into_iter().take(n_parents).map(|(ind, _)| ind).collect();

            let mut offspring = Vec::with_capacity(self.population);
            while offspring.len() < self.population {
                let pair = index::sample(rng, parents.len(), 2);
                let mut child = crossover(&parents[pair.index(0)], &parents[pair.index(1)], rng);
                if rng.random_bool(self.mutation_rate) {
                    mutate(&mut child, rng);
                }
                offspring.push(child);
            }
            population = offspring;
        }

        let picks = rank(population, &draw_masks)
            .into_iter()
            .take(count)
            .map(|(ind, f)| Pick::scored(ind, f as f64))
            .collect();
        Ok(Prediction::Picks(picks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictors::assert_valid_set;
    use crate::{make_test_draws, scenario_draws};
    use rand::SeedableRng;

    fn masks(draws: &[Draw]) -> Vec<u64> {
        draws.iter().map(Draw::mask).collect()
    }

    #[test]
    fn test_fitness_scenario() {
        let m = masks(&scenario_draws());
        assert_eq!(fitness(&[1, 2, 3, 4], &m), 2);
        assert_eq!(fitness(&[1, 2, 3, 7], &m), 1);
        assert_eq!(fitness(&[1, 2, 7, 8], &m), 0);
    }

    #[test]
    fn test_fitness_order_invariant_and_bounded() {
        let draws = make_test_draws(50);
        let m = masks(&draws);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let set: Vec<u8> = index::sample(&mut rng, 49, 4)
                .into_iter()
                .map(|i| i as u8 + 1)
                .collect();
            let mut reversed = set.clone();
            reversed.reverse();
            let f = fitness(&set, &m);
            assert_eq!(f, fitness(&reversed, &m));
            assert!(f <= draws.len());
        }
        // un sous-ensemble d'un tirage réel a une fitness >= 1
        assert!(fitness(&draws[0].numbers[..4], &m) >= 1);
    }

    #[test]
    fn test_crossover_repairs_duplicates() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..200 {
            let child = crossover(&[1, 2, 3, 4], &[2, 3, 4, 5], &mut rng);
            assert_valid_set(&child);
        }
    }

    #[test]
    fn test_mutation_keeps_distinct() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut ind = [10, 20, 30, 40];
        for _ in 0..200 {
            mutate(&mut ind, &mut rng);
            assert_valid_set(&ind);
        }
    }

    #[test]
    fn test_initial_individuals_come_from_history() {
        let draws = scenario_draws();
        let table = FrequencyTable::from_draws(&draws);
        let weighted: Vec<(u8, f64)> = table
            .encounter_order()
            .iter()
            .map(|&n| (n, table.count(n) as f64))
            .collect();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let ind = random_individual(&weighted, &mut rng).unwrap();
            assert_valid_set(&ind);
            assert!(ind.iter().all(|n| (1..=8).contains(n)));
        }
    }

    #[test]
    fn test_top_individuals_ranked_by_fitness() {
        let mut rng = StdRng::seed_from_u64(42);
        let Prediction::Picks(picks) = GeneticPredictor::new(40, 20, 0.1)
            .predict(&scenario_draws(), 5, &mut rng)
            .unwrap()
        else {
            panic!("attendu : ensembles");
        };
        assert_eq!(picks.len(), 5);
        let scores: Vec<f64> = picks.iter().map(|p| p.score.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|&s| s <= 2.0));
        for pick in &picks {
            assert_valid_set(&pick.numbers);
        }
    }
}
