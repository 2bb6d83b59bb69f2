use std::path::Path;

use anyhow::{Context, Result};
use uk49s_db::rusqlite::Connection;

use uk49s_db::dataset::{load_json, merge_year_files, save_json, MergeReport};
use uk49s_db::db::{fetch_all_draws, insert_draw};
use uk49s_db::models::Draw;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

/// Insère les tirages dans une seule transaction ; les doublons sont ignorés.
pub fn insert_draws(conn: &Connection, draws: &[Draw]) -> Result<ImportResult> {
    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();
    for draw in draws {
        result.total_records += 1;
        match insert_draw(&tx, draw) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                log::error!("Erreur insertion tirage {} ({}) : {:#}", draw.date, draw.session, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!("{} tirages insérés sur {}", result.inserted, result.total_records);
    Ok(result)
}

pub fn import_file(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let draws = load_json(path)?;
    insert_draws(conn, &draws)
}

/// Fusionne les fichiers annuels de `dir` puis les insère.
pub fn import_dir(
    conn: &Connection,
    dir: &Path,
    first_year: i32,
    last_year: i32,
) -> Result<(ImportResult, MergeReport)> {
    let report = merge_year_files(dir, first_year, last_year);
    let result = insert_draws(conn, &report.draws)?;
    Ok((result, report))
}

/// Écrit toute la base en JSON trié (date décroissante, teatime avant lunchtime).
pub fn export_json(conn: &Connection, path: &Path) -> Result<usize> {
    let draws = fetch_all_draws(conn)?;
    save_json(path, &draws)?;
    Ok(draws.len())
}
