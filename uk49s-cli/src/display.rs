use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use uk49s_analysis::aggregator::{NumberTrace, PlaySuggestion, SampleCollection};
use uk49s_analysis::frequency::{FrequencyTable, GroupKey};
use uk49s_analysis::predictors::{Pick, Prediction};
use uk49s_db::dataset::MergeReport;
use uk49s_db::models::{Draw, Session};

use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Date", "Session", "Numéros", "Bonus"]);
    for draw in draws {
        let mut main = draw.numbers[..6].to_vec();
        main.sort_unstable();
        table.add_row(vec![
            draw.date.format("%Y-%m-%d").to_string(),
            draw.session.to_string(),
            join_numbers(&main),
            format!("{:2}", draw.numbers[6]),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total tirages lus : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_merge_report(report: &MergeReport) {
    println!("Fusion des fichiers annuels :");
    println!("  Fichiers lus      : {}", report.files_read);
    println!("  Tirages distincts : {}", report.draws.len());
    if !report.missing.is_empty() {
        println!("  Fichiers absents  : {}", report.missing.len());
    }
    for path in &report.invalid {
        println!("  Fichier invalide  : {}", path.display());
    }
}

pub fn display_frequency(table: &FrequencyTable, title: &str, top: usize) {
    println!("\n📊 Fréquences : {title} ({} tirages)\n", table.n_draws());

    let mut out = new_table(vec!["Rang", "Numéro", "Sorties", "Taux par tirage"]);
    for (rank, (number, count)) in table.ranked().into_iter().take(top).enumerate() {
        out.add_row(vec![
            format!("{}", rank + 1),
            format!("{:2}", number),
            count.to_string(),
            format!("{:.4}", table.recurrence_probability(number)),
        ]);
    }
    println!("{out}");
}

pub fn display_conditional(key: &GroupKey, top: &[(u8, f64)], bottom: &[(u8, f64)]) {
    println!("\n── Probabilités conditionnelles : {key} ──");

    let mut table = new_table(vec!["Numéro", "Probabilité", "Sens"]);
    for (entries, label, color) in [(top, "haut", Color::Green), (bottom, "bas", Color::Red)] {
        for &(number, p) in entries {
            table.add_row(vec![
                Cell::new(format!("{:2}", number)),
                Cell::new(format!("{:.4}", p)),
                Cell::new(label).fg(color),
            ]);
        }
    }
    println!("{table}");
}

pub fn display_samples(collection: &SampleCollection) {
    println!(
        "\n🧺 {} échantillons pour le {}\n",
        collection.len(),
        collection.target().format("%Y-%m-%d")
    );

    let mut table = new_table(vec!["Échantillon", "Numéros"]);
    for (key, candidates) in collection.iter() {
        let numbers: Vec<u8> = candidates.iter().map(|c| c.number).collect();
        table.add_row(vec![key.to_string(), join_numbers(&numbers)]);
    }
    println!("{table}");
}

pub fn display_suggestions(session: Session, suggestions: &[PlaySuggestion]) {
    println!("\n🎲 Suggestions {session}\n");

    let mut table = new_table(vec!["Graine", "Présences", "Compagnons", "Paires"]);
    for s in suggestions {
        let companions = s
            .companions
            .iter()
            .map(|(n, c)| format!("{n} ({c})"))
            .collect::<Vec<_>>()
            .join(", ");
        let pairs = s
            .pairs()
            .map(|(a, b)| format!("{a}-{b}"))
            .collect::<Vec<_>>()
            .join("  ");
        table.add_row(vec![
            format!("{:2}", s.seed),
            s.hits.to_string(),
            companions,
            pairs,
        ]);
    }
    println!("{table}");
}

pub fn display_traces(traces: &[NumberTrace]) {
    let mut table = new_table(vec!["Numéro", "Présences", "Échantillons"]);
    for trace in traces {
        let sources = trace
            .sources
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let hits = Cell::new(trace.hits).fg(if trace.hits > 0 { Color::Green } else { Color::Red });
        table.add_row(vec![Cell::new(format!("{:2}", trace.number)), hits, Cell::new(sources)]);
    }
    println!("{table}");
}

fn display_picks(picks: &[Pick]) {
    let mut table = new_table(vec!["#", "Numéros", "Score"]);
    for (i, pick) in picks.iter().enumerate() {
        let score = match pick.score {
            Some(s) => format!("{:.4}", s),
            None => "—".to_string(),
        };
        table.add_row(vec![format!("{}", i + 1), join_numbers(&pick.numbers), score]);
    }
    println!("{table}");
}

pub fn display_prediction(name: &str, prediction: &Prediction) {
    println!("\n🔮 {name}\n");
    match prediction {
        Prediction::Numbers(numbers) => println!("Numéros à jouer : {}", join_numbers(numbers)),
        Prediction::Picks(picks) if picks.is_empty() => println!("Aucune prédiction."),
        Prediction::Picks(picks) => display_picks(picks),
    }
}
