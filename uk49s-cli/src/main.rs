mod display;
mod import;
mod scrape;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use uk49s_analysis::aggregator::{play_suggestions, trace_numbers, SampleCollection};
use uk49s_analysis::config::PredictorConfig;
use uk49s_analysis::frequency::{
    bottom_n, filter_draws, top_n, ConditionalMatrix, FrequencyTable, GroupKey, Grouping, Recency,
    SessionScope,
};
use uk49s_analysis::predictors::{all_predictors, Method, Predictor};
use uk49s_db::db::{
    count_draws, db_path, fetch_all_draws, fetch_last_draws, insert_draw, latest_draw, migrate,
    open_db,
};
use uk49s_db::models::{validate_numbers, Draw, Session, NUMBERS_PER_DRAW};
use uk49s_db::rusqlite::Connection;

use crate::display::{
    display_conditional, display_draws, display_frequency, display_import_summary,
    display_merge_report, display_prediction, display_samples, display_suggestions,
    display_traces,
};
use crate::scrape::{apply_cutoff, fetch_year, http_client, ResultsPage};

/// Premier millésime des fichiers annuels.
const FIRST_YEAR: i32 = 1996;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    Combined,
    Lunchtime,
    Teatime,
}

impl From<ScopeArg> for SessionScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Combined => SessionScope::Combined,
            ScopeArg::Lunchtime => SessionScope::Lunchtime,
            ScopeArg::Teatime => SessionScope::Teatime,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecencyArg {
    All,
    Last49,
}

impl From<RecencyArg> for Recency {
    fn from(arg: RecencyArg) -> Self {
        match arg {
            RecencyArg::All => Recency::AllTime,
            RecencyArg::Last49 => Recency::Last49,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    MonteCarlo,
    Importance,
    Mcmc,
    Smc,
    Integration,
    Bootstrap,
    Genetic,
    All,
}

impl MethodArg {
    fn method(self) -> Option<Method> {
        match self {
            MethodArg::MonteCarlo => Some(Method::MonteCarlo),
            MethodArg::Importance => Some(Method::Importance),
            MethodArg::Mcmc => Some(Method::Mcmc),
            MethodArg::Smc => Some(Method::Smc),
            MethodArg::Integration => Some(Method::Integration),
            MethodArg::Bootstrap => Some(Method::Bootstrap),
            MethodArg::Genetic => Some(Method::Genetic),
            MethodArg::All => None,
        }
    }
}

#[derive(Parser)]
#[command(name = "uk49s", about = "Analyse des tirages UK 49s et prédicteurs par rééchantillonnage")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer des tirages JSON (fichier fusionné ou fichiers annuels)
    Import {
        /// Fichier JSON fusionné
        #[arg(short, long, conflicts_with = "dir")]
        file: Option<PathBuf>,

        /// Répertoire des fichiers uk-49s-{session}-results-{année}.json
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Première année à fusionner
        #[arg(long, default_value_t = FIRST_YEAR)]
        from: i32,

        /// Dernière année à fusionner (année courante par défaut)
        #[arg(long)]
        to: Option<i32>,
    },

    /// Exporter la base en JSON fusionné
    Export {
        #[arg(short, long, default_value = "merged_uk_49s_results.json")]
        output: PathBuf,
    },

    /// Récupérer les derniers résultats en ligne
    Update {
        /// Première année à récupérer (année courante par défaut)
        #[arg(long)]
        from_year: Option<i32>,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Fréquences, taux de sortie et probabilités conditionnelles
    Stats {
        #[arg(short, long, default_value = "combined")]
        scope: ScopeArg,

        #[arg(short, long, default_value = "all")]
        recency: RecencyArg,

        /// Date de référence AAAA-MM-JJ (aujourd'hui par défaut)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Nombre de numéros affichés
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Échantillons étiquetés et suggestions de jeu par session
    Suggest {
        /// Date visée AAAA-MM-JJ (aujourd'hui par défaut)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Retrouver des numéros joués dans le pool de candidats
    Trace {
        /// Numéros à tracer
        #[arg(required = true)]
        numbers: Vec<u8>,

        #[arg(short, long, default_value = "combined")]
        scope: ScopeArg,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Générer des prédictions
    Predict {
        #[arg(short, long, default_value = "all")]
        method: MethodArg,

        #[arg(short, long, default_value = "lunchtime")]
        session: ScopeArg,

        /// Nombre de prédictions
        #[arg(short, long, default_value = "5")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,

        /// Seed dérivée de la date du jour (ignorée si --seed est donné)
        #[arg(long)]
        daily_seed: bool,

        /// Paramètres des prédicteurs (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Ajouter un tirage manuellement
    Add,
}

fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file, dir, from, to } => cmd_import(&conn, file, dir, from, to),
        Command::Export { output } => cmd_export(&conn, &output),
        Command::Update { from_year } => cmd_update(&conn, from_year),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { scope, recency, date, top } => {
            cmd_stats(&conn, scope.into(), recency.into(), date.unwrap_or_else(today), top)
        }
        Command::Suggest { date } => cmd_suggest(&conn, date.unwrap_or_else(today)),
        Command::Trace { numbers, scope, date } => {
            cmd_trace(&conn, &numbers, scope.into(), date.unwrap_or_else(today))
        }
        Command::Predict {
            method,
            session,
            count,
            seed,
            daily_seed,
            config,
        } => cmd_predict(&conn, method, session.into(), count, seed, daily_seed, config),
        Command::Add => cmd_add(&conn),
    }
}

/// Charge l'historique, ou `None` si la base est vide.
fn load_history(conn: &Connection) -> Result<Option<Vec<Draw>>> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : uk49s import ou uk49s update");
        return Ok(None);
    }
    Ok(Some(fetch_all_draws(conn)?))
}

fn cmd_import(
    conn: &Connection,
    file: Option<PathBuf>,
    dir: Option<PathBuf>,
    from: i32,
    to: Option<i32>,
) -> Result<()> {
    match (file, dir) {
        (Some(file), _) => {
            let result = import::import_file(conn, &file)?;
            display_import_summary(&result);
        }
        (None, Some(dir)) => {
            let to = to.unwrap_or_else(|| today().year());
            if from > to {
                bail!("Plage d'années invalide : {from} > {to}");
            }
            let (result, report) = import::import_dir(conn, &dir, from, to)?;
            display_merge_report(&report);
            display_import_summary(&result);
        }
        (None, None) => bail!("Indiquez --file ou --dir"),
    }
    Ok(())
}

fn cmd_export(conn: &Connection, output: &Path) -> Result<()> {
    let n = import::export_json(conn, output)?;
    println!("{n} tirages exportés vers {}", output.display());
    Ok(())
}

fn cmd_update(conn: &Connection, from_year: Option<i32>) -> Result<()> {
    let current = today().year();
    let first = from_year.unwrap_or(current);
    if first > current {
        bail!("Année de départ dans le futur : {first}");
    }

    let latest = latest_draw(conn)?;
    if let Some(d) = &latest {
        println!("Dernier tirage connu : {} {}", d.date, d.session);
    }

    let client = http_client()?;
    let page = ResultsPage::new()?;
    let years: Vec<i32> = (first..=current).collect();

    let pb = ProgressBar::new((years.len() * Session::ALL.len()) as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Modèle de barre de progression invalide")?
            .progress_chars("=> "),
    );

    let mut scraped = Vec::new();
    let mut skipped = 0;
    let mut failed = 0;
    for &year in &years {
        for session in Session::ALL {
            pb.set_message(format!("{session} {year}"));
            match fetch_year(&client, session, year) {
                Ok(html) => {
                    let outcome = page.parse(&html, session);
                    skipped += outcome.skipped;
                    scraped.extend(outcome.draws);
                }
                Err(e) => {
                    log::warn!("{:#}", e);
                    failed += 1;
                }
            }
            pb.inc(1);
        }
    }
    pb.finish_with_message("terminé");

    let fresh = apply_cutoff(scraped, latest.as_ref());
    let result = import::insert_draws(conn, &fresh)?;
    display_import_summary(&result);
    if skipped > 0 {
        println!("  Lignes illisibles  : {skipped}");
    }
    if failed > 0 {
        println!("  Pages en échec     : {failed}");
    }
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    if count_draws(conn)? == 0 {
        println!("Base vide. Lancez d'abord : uk49s import ou uk49s update");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(
    conn: &Connection,
    scope: SessionScope,
    recency: Recency,
    date: NaiveDate,
    top: usize,
) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    let draws = filter_draws(&history, scope, recency, date);
    if draws.is_empty() {
        println!("Aucun tirage pour {scope} / {} au {date}.", recency.label());
        return Ok(());
    }

    let table = FrequencyTable::from_draws(&draws);
    display_frequency(&table, &format!("{scope} / {}", recency.label()), top);

    for grouping in [Grouping::DayOfMonth, Grouping::DayOfWeek] {
        let key = GroupKey::of(grouping, date);
        let column = ConditionalMatrix::from_draws(&draws, grouping).column(&key);
        display_conditional(&key, &top_n(&column, top), &bottom_n(&column, top));
    }
    Ok(())
}

fn cmd_suggest(conn: &Connection, date: NaiveDate) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    let collection = SampleCollection::build(&history, date);
    display_samples(&collection);

    for session in Session::ALL {
        let suggestions = play_suggestions(&collection, &history, session.into());
        display_suggestions(session, &suggestions);
    }
    Ok(())
}

fn cmd_trace(conn: &Connection, numbers: &[u8], scope: SessionScope, date: NaiveDate) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    let collection = SampleCollection::build(&history, date);
    let pool = collection.pool(scope);
    println!("Pool {scope} : {} candidats", pool.len());
    display_traces(&trace_numbers(&pool, numbers));
    Ok(())
}

fn cmd_predict(
    conn: &Connection,
    method: MethodArg,
    scope: SessionScope,
    count: usize,
    seed: Option<u64>,
    daily_seed: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let Some(history) = load_history(conn)? else {
        return Ok(());
    };
    let draws = filter_draws(&history, scope, Recency::AllTime, today());

    let config = match config {
        Some(path) => PredictorConfig::load(&path)?,
        None => PredictorConfig::default(),
    };

    let seed = seed.or_else(|| daily_seed.then(date_seed));
    let mut rng: StdRng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let predictors: Vec<Box<dyn Predictor>> = match method.method() {
        Some(m) => vec![m.build(&config)],
        None => all_predictors(&config),
    };

    println!("{} tirages {scope}", draws.len());
    let single = predictors.len() == 1;
    for predictor in &predictors {
        match predictor.predict(&draws, count, &mut rng) {
            Ok(prediction) => display_prediction(predictor.name(), &prediction),
            // une méthode en échec n'empêche pas les autres
            Err(e) if !single => println!("\n⚠ {} : {e}", predictor.name()),
            Err(e) => return Err(e).with_context(|| format!("Prédicteur {}", predictor.name())),
        }
    }
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let raw_date = prompt("Date (AAAA-MM-JJ) : ")?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .with_context(|| format!("Format de date invalide : '{raw_date}'"))?;
    let session: Session = prompt("Session (lunchtime/teatime) : ")?.parse()?;
    let numbers = prompt_numbers()?;

    let draw = Draw { date, session, numbers };

    println!("\nTirage à insérer :");
    display_draws(&[draw]);

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if insert_draw(conn, &draw)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    read_answer(&mut io::stdin().lock())
}

/// Une ligne saisie, sans espaces autour. Échoue quand l'entrée est fermée.
fn read_answer(reader: &mut impl BufRead) -> Result<String> {
    let mut input = String::new();
    let read = reader.read_line(&mut input).context("Erreur de lecture")?;
    if read == 0 {
        bail!("Entrée standard fermée avant la saisie");
    }
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<[u8; NUMBERS_PER_DRAW]> {
    loop {
        let input = prompt("7 numéros dans l'ordre de sortie, bonus en dernier (1-49) : ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums.ok().and_then(|v| <[u8; NUMBERS_PER_DRAW]>::try_from(v).ok()) {
            Some(arr) => match validate_numbers(&arr) {
                Ok(()) => return Ok(arr),
                Err(e) => println!("{e}. Réessayez."),
            },
            None => println!("Entrez exactement 7 numéros. Réessayez."),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_read_answer_trims_line() {
        let mut input = Cursor::new("  12 5 7\n49\n");
        assert_eq!(read_answer(&mut input).unwrap(), "12 5 7");
        assert_eq!(read_answer(&mut input).unwrap(), "49");
    }

    #[test]
    fn test_read_answer_fails_on_closed_input() {
        let mut input = Cursor::new("");
        assert!(read_answer(&mut input).is_err());

        // Une ligne vide reste une réponse valide
        let mut blank = Cursor::new("\n");
        assert_eq!(read_answer(&mut blank).unwrap(), "");
        assert!(read_answer(&mut blank).is_err());
    }
}
