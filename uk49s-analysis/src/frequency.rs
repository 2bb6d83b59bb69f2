use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use uk49s_db::models::{Draw, Session, MAX_NUMBER, NUMBERS_PER_DRAW};

/// Taille de la fenêtre récente, en jours calendaires.
pub const RECENCY_DAYS: i64 = 49;

const SLOTS: usize = MAX_NUMBER as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Recency {
    AllTime,
    Last49,
}

impl Recency {
    pub const ALL: [Recency; 2] = [Recency::AllTime, Recency::Last49];

    pub fn label(&self) -> &'static str {
        match self {
            Recency::AllTime => "all",
            Recency::Last49 => "last49",
        }
    }

    /// Première date incluse dans la fenêtre, `None` pour tout l'historique.
    /// La fenêtre couvre les 49 jours se terminant à `reference` inclus.
    pub fn window_start(&self, reference: NaiveDate) -> Option<NaiveDate> {
        match self {
            Recency::AllTime => None,
            Recency::Last49 => Some(reference - Duration::days(RECENCY_DAYS - 1)),
        }
    }

    /// Aucune fenêtre ne dépasse `reference` : les tirages postérieurs sont exclus.
    pub fn contains(&self, date: NaiveDate, reference: NaiveDate) -> bool {
        date <= reference && self.window_start(reference).is_none_or(|s| date >= s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionScope {
    Combined,
    Lunchtime,
    Teatime,
}

impl SessionScope {
    pub const ALL: [SessionScope; 3] = [
        SessionScope::Combined,
        SessionScope::Lunchtime,
        SessionScope::Teatime,
    ];

    pub fn session(&self) -> Option<Session> {
        match self {
            SessionScope::Combined => None,
            SessionScope::Lunchtime => Some(Session::Lunchtime),
            SessionScope::Teatime => Some(Session::Teatime),
        }
    }

    pub fn matches(&self, session: Session) -> bool {
        self.session().is_none_or(|s| s == session)
    }
}

impl From<Session> for SessionScope {
    fn from(session: Session) -> Self {
        match session {
            Session::Lunchtime => SessionScope::Lunchtime,
            Session::Teatime => SessionScope::Teatime,
        }
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session() {
            Some(session) => write!(f, "{session}"),
            None => f.write_str("combined"),
        }
    }
}

pub fn filter_draws(
    draws: &[Draw],
    scope: SessionScope,
    recency: Recency,
    reference: NaiveDate,
) -> Vec<Draw> {
    draws
        .iter()
        .filter(|d| scope.matches(d.session))
        .filter(|d| recency.contains(d.date, reference))
        .copied()
        .collect()
}

#[derive(Debug, Clone)]
pub struct FrequencyTable {
    counts: [u32; SLOTS],
    order: Vec<u8>,
    n_draws: usize,
}

impl FrequencyTable {
    pub fn from_draws(draws: &[Draw]) -> Self {
        let mut counts = [0u32; SLOTS];
        let mut order = Vec::new();
        for draw in draws {
            for &n in &draw.numbers {
                let idx = n as usize;
                if idx >= SLOTS {
                    continue;
                }
                if counts[idx] == 0 {
                    order.push(n);
                }
                counts[idx] += 1;
            }
        }
        Self {
            counts,
            order,
            n_draws: draws.len(),
        }
    }

    pub fn n_draws(&self) -> usize {
        self.n_draws
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn count(&self, number: u8) -> u32 {
        self.counts.get(number as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Numéros observés, dans l'ordre de première apparition.
    pub fn encounter_order(&self) -> &[u8] {
        &self.order
    }

    /// `(numéro, effectif)` par effectif décroissant ; tri stable sur l'ordre de rencontre.
    pub fn ranked(&self) -> Vec<(u8, u32)> {
        let mut ranked: Vec<(u8, u32)> = self.order.iter().map(|&n| (n, self.count(n))).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Taux d'apparition par tirage : effectif / nombre de tirages.
    pub fn recurrence_probability(&self, number: u8) -> f64 {
        if self.n_draws == 0 {
            return 0.0;
        }
        self.count(number) as f64 / self.n_draws as f64
    }

    pub fn recurrence_probabilities(&self) -> Vec<(u8, f64)> {
        self.ranked()
            .into_iter()
            .map(|(n, _)| (n, self.recurrence_probability(n)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grouping {
    DayOfMonth,
    DayOfWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    DayOfMonth(u32),
    DayOfWeek(Weekday),
}

impl GroupKey {
    pub fn of(grouping: Grouping, date: NaiveDate) -> Self {
        match grouping {
            Grouping::DayOfMonth => GroupKey::DayOfMonth(date.day()),
            Grouping::DayOfWeek => GroupKey::DayOfWeek(date.weekday()),
        }
    }

    fn sort_index(&self) -> u32 {
        match self {
            GroupKey::DayOfMonth(d) => *d,
            GroupKey::DayOfWeek(w) => w.num_days_from_monday(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::DayOfMonth(d) => write!(f, "{d}"),
            GroupKey::DayOfWeek(w) => f.write_str(weekday_name(*w)),
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Effectifs d'une clé de regroupement. `slots` = numéros tirés sur cette clé (7 par tirage).
#[derive(Debug, Clone)]
pub struct ConditionalRow {
    counts: [u32; SLOTS],
    slots: u32,
}

impl ConditionalRow {
    fn new() -> Self {
        Self {
            counts: [0u32; SLOTS],
            slots: 0,
        }
    }

    pub fn probability(&self, number: u8) -> f64 {
        match self.counts.get(number as usize) {
            Some(&c) if self.slots > 0 => c as f64 / self.slots as f64,
            _ => 0.0,
        }
    }

    pub fn draws(&self) -> u32 {
        self.slots / NUMBERS_PER_DRAW as u32
    }
}

/// Clé de regroupement → (numéro → probabilité). Pour une clé donnée les probabilités
/// sont conditionnées séparément et ne somment à 1 que sur l'ensemble des numéros tirés.
#[derive(Debug, Clone)]
pub struct ConditionalMatrix {
    grouping: Grouping,
    rows: HashMap<GroupKey, ConditionalRow>,
    numbers: Vec<u8>,
}

impl ConditionalMatrix {
    pub fn from_draws(draws: &[Draw], grouping: Grouping) -> Self {
        let mut rows: HashMap<GroupKey, ConditionalRow> = HashMap::new();
        for draw in draws {
            let row = rows
                .entry(GroupKey::of(grouping, draw.date))
                .or_insert_with(ConditionalRow::new);
            for &n in &draw.numbers {
                if let Some(c) = row.counts.get_mut(n as usize) {
                    *c += 1;
                    row.slots += 1;
                }
            }
        }
        let numbers = FrequencyTable::from_draws(draws).encounter_order().to_vec();
        Self {
            grouping,
            rows,
            numbers,
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn row(&self, key: &GroupKey) -> Option<&ConditionalRow> {
        self.rows.get(key)
    }

    /// 0 quand la clé ou le numéro n'a jamais été observé.
    pub fn probability(&self, key: &GroupKey, number: u8) -> f64 {
        self.rows.get(key).map_or(0.0, |row| row.probability(number))
    }

    pub fn keys(&self) -> Vec<GroupKey> {
        let mut keys: Vec<GroupKey> = self.rows.keys().copied().collect();
        keys.sort_by_key(|k| k.sort_index());
        keys
    }

    /// Probabilités de tous les numéros du sous-ensemble pour une clé, ordre de rencontre.
    pub fn column(&self, key: &GroupKey) -> Vec<(u8, f64)> {
        self.numbers
            .iter()
            .map(|&n| (n, self.probability(key, n)))
            .collect()
    }
}

/// Les `n` meilleures probabilités ; à égalité l'ordre d'entrée est conservé.
pub fn top_n(entries: &[(u8, f64)], n: usize) -> Vec<(u8, f64)> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

pub fn bottom_n(entries: &[(u8, f64)], n: usize) -> Vec<(u8, f64)> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}
