use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::{canonical_order, validate_numbers, Draw, Session};

/// Nom des fichiers annuels : `uk-49s-lunchtime-results-2024.json`.
pub fn year_file_name(session: Session, year: i32) -> String {
    format!("uk-49s-{}-results-{}.json", session, year)
}

pub fn parse_json(json: &str) -> Result<Vec<Draw>> {
    let draws: Vec<Draw> = serde_json::from_str(json).context("JSON de tirages invalide")?;
    for (i, draw) in draws.iter().enumerate() {
        validate_numbers(&draw.numbers)
            .with_context(|| format!("Tirage invalide à l'index {} ({} {})", i, draw.date, draw.session))?;
    }
    Ok(draws)
}

pub fn load_json(path: &Path) -> Result<Vec<Draw>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    parse_json(&json).with_context(|| format!("Fichier {:?}", path))
}

pub fn save_json(path: &Path, draws: &[Draw]) -> Result<()> {
    let json = serde_json::to_string_pretty(draws)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn sort_canonical(draws: &mut [Draw]) {
    draws.sort_by(canonical_order);
}

/// Supprime les doublons `(date, session)` en gardant la première occurrence.
pub fn dedup_draws(draws: Vec<Draw>) -> Vec<Draw> {
    let mut seen = HashSet::new();
    draws
        .into_iter()
        .filter(|d| seen.insert((d.date, d.session)))
        .collect()
}

#[derive(Debug, Default)]
pub struct MergeReport {
    pub draws: Vec<Draw>,
    pub files_read: u32,
    pub missing: Vec<PathBuf>,
    pub invalid: Vec<PathBuf>,
}

pub fn merge_year_files(dir: &Path, first_year: i32, last_year: i32) -> MergeReport {
    let mut report = MergeReport::default();
    let mut merged = Vec::new();

    for year in first_year..=last_year {
        for session in Session::ALL {
            let path = dir.join(year_file_name(session, year));
            if !path.exists() {
                log::warn!("Fichier absent : {}", path.display());
                report.missing.push(path);
                continue;
            }
            match load_json(&path) {
                Ok(draws) => {
                    log::debug!("{} : {} tirages", path.display(), draws.len());
                    report.files_read += 1;
                    merged.extend(draws);
                }
                Err(e) => {
                    log::error!("{:#}", e);
                    report.invalid.push(path);
                }
            }
        }
    }

    let mut draws = dedup_draws(merged);
    sort_canonical(&mut draws);
    report.draws = draws;
    report
}
