pub mod aggregator;
pub mod config;
pub mod cooccurrence;
pub mod distribution;
pub mod error;
pub mod frequency;
pub mod predictors;

pub use error::{PredictError, Result};

#[cfg(test)]
pub(crate) fn make_test_draws(n: usize) -> Vec<uk49s_db::models::Draw> {
    use uk49s_db::models::{Draw, Session};

    let base = chrono::NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    (0..n)
        .map(|i| {
            let start = (i * 5) % 49;
            let mut numbers = [0u8; 7];
            for (k, slot) in numbers.iter_mut().enumerate() {
                *slot = ((start + k * 7) % 49 + 1) as u8;
            }
            Draw {
                date: base - chrono::Duration::days((i / 2) as i64),
                session: if i % 2 == 0 { Session::Teatime } else { Session::Lunchtime },
                numbers,
            }
        })
        .collect()
}

/// D = [{2025-01-01, lunchtime, [1..7]}, {2025-01-08, lunchtime, [1..6, 8]}]
#[cfg(test)]
pub(crate) fn scenario_draws() -> Vec<uk49s_db::models::Draw> {
    use uk49s_db::models::{Draw, Session};

    vec![
        Draw {
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            session: Session::Lunchtime,
            numbers: [1, 2, 3, 4, 5, 6, 7],
        },
        Draw {
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 8).unwrap(),
            session: Session::Lunchtime,
            numbers: [1, 2, 3, 4, 5, 6, 8],
        },
    ]
}
