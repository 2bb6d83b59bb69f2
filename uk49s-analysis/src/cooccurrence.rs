use uk49s_db::models::Draw;

/// Nombre de compagnons retenus par numéro-graine.
pub const COMPANION_COUNT: usize = 3;

/// Les `limit` numéros les plus souvent tirés avec `number`, sur tout l'historique.
/// À effectif égal, l'ordre de première apparition départage.
pub fn companions(draws: &[Draw], number: u8, limit: usize) -> Vec<(u8, u32)> {
    let mut counts: Vec<(u8, u32)> = Vec::new();
    for draw in draws.iter().filter(|d| d.contains(number)) {
        for &other in draw.numbers.iter().filter(|&&n| n != number) {
            match counts.iter_mut().find(|(n, _)| *n == other) {
                Some((_, c)) => *c += 1,
                None => counts.push((other, 1)),
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario_draws;
    use chrono::NaiveDate;
    use uk49s_db::models::Session;

    #[test]
    fn test_companions_scenario() {
        let draws = scenario_draws();
        let top = companions(&draws, 1, COMPANION_COUNT);
        assert_eq!(top, vec![(2, 2), (3, 2), (4, 2)]);

        let top = companions(&draws, 7, COMPANION_COUNT);
        assert_eq!(top, vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_companions_ranked_by_count() {
        let mut draws = scenario_draws();
        draws.push(Draw {
            date: NaiveDate::from_ymd_opt(2025, 1, 9).unwrap(),
            session: Session::Teatime,
            numbers: [8, 6, 40, 41, 42, 43, 44],
        });
        let top = companions(&draws, 8, 2);
        assert_eq!(top, vec![(6, 2), (1, 1)]);
    }

    #[test]
    fn test_companions_unknown_number() {
        assert!(companions(&scenario_draws(), 49, 3).is_empty());
    }
}
