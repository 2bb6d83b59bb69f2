use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::blocking::Client;

use uk49s_db::models::{validate_numbers, Draw, Session, NUMBERS_PER_DRAW};

const BASE_URL: &str = "https://za.lottonumbers.com";
const HTTP_USER_AGENT: &str = "uk49s-cli/0.1";

pub fn results_url(session: Session, year: i32) -> String {
    format!("{BASE_URL}/uk-49s-{session}/results/{year}")
}

pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(HTTP_USER_AGENT)
        .build()
        .context("Impossible de créer le client HTTP")
}

pub fn fetch_year(client: &Client, session: Session, year: i32) -> Result<String> {
    let url = results_url(session, year);
    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("Requête échouée : {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("{url} : statut HTTP {status}");
    }
    response
        .text()
        .with_context(|| format!("Lecture de la réponse impossible : {url}"))
}

#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub draws: Vec<Draw>,
    pub skipped: u32,
}

/// Extraction des résultats d'une page annuelle : une ligne `<tr>` par tirage,
/// date dans la première cellule, numéros en `<li>` dans la seconde.
pub struct ResultsPage {
    row: Regex,
    cell: Regex,
    item: Regex,
    tag: Regex,
    ordinal: Regex,
}

impl ResultsPage {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>")?,
            cell: Regex::new(r"(?is)<td[^>]*>(.*?)</td>")?,
            item: Regex::new(r"(?is)<li[^>]*>(.*?)</li>")?,
            tag: Regex::new(r"<[^>]*>")?,
            ordinal: Regex::new(r"(\d+)(st|nd|rd|th)\b")?,
        })
    }

    fn text(&self, html: &str) -> String {
        let stripped = self.tag.replace_all(html, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// "Thursday 26th March 2025" -> 2025-03-26
    pub fn parse_date(&self, cell: &str) -> Option<NaiveDate> {
        let text = self.text(cell);
        let without_weekday = text.split_once(' ')?.1;
        let plain = self.ordinal.replace_all(without_weekday, "$1");
        NaiveDate::parse_from_str(&plain, "%d %B %Y").ok()
    }

    fn parse_numbers(&self, cell: &str) -> Option<[u8; NUMBERS_PER_DRAW]> {
        let values = self
            .item
            .captures_iter(cell)
            .map(|c| self.text(&c[1]).parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()?;
        values.try_into().ok()
    }

    pub fn parse(&self, html: &str, session: Session) -> ScrapeOutcome {
        let mut outcome = ScrapeOutcome::default();
        for row in self.row.captures_iter(html) {
            let cells: Vec<&str> = self
                .cell
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();
            if cells.len() < 2 {
                continue;
            }

            let Some(date) = self.parse_date(cells[0]) else {
                log::warn!("Date invalide ignorée : '{}'", self.text(cells[0]));
                outcome.skipped += 1;
                continue;
            };
            let Some(numbers) = self.parse_numbers(cells[1]) else {
                log::warn!("Numéros illisibles le {date} ({session}), ligne ignorée");
                outcome.skipped += 1;
                continue;
            };
            if let Err(e) = validate_numbers(&numbers) {
                log::warn!("Tirage du {date} ({session}) ignoré : {e}");
                outcome.skipped += 1;
                continue;
            }
            outcome.draws.push(Draw { date, session, numbers });
        }
        outcome
    }
}

/// Garde les tirages postérieurs au dernier tirage connu : même jour inclus
/// si c'était un lunchtime, à partir du lendemain si c'était un teatime.
pub fn apply_cutoff(draws: Vec<Draw>, latest: Option<&Draw>) -> Vec<Draw> {
    let Some(latest) = latest else {
        return draws;
    };
    let cutoff = match latest.session {
        Session::Lunchtime => latest.date,
        Session::Teatime => latest.date + chrono::Duration::days(1),
    };
    draws.into_iter().filter(|d| d.date >= cutoff).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<table class="past-results">
  <thead><tr><th>Date</th><th>Result</th></tr></thead>
  <tbody>
    <tr>
      <td class="date-row"><a href="/uk-49s-teatime/results/26-03-2025">Wednesday 26th March 2025</a></td>
      <td><ul class="balls"><li class="ball">3</li><li class="ball">11</li><li class="ball">19</li>
        <li class="ball">24</li><li class="ball">37</li><li class="ball">45</li><li class="bonus-ball">8</li></ul></td>
    </tr>
    <tr>
      <td>Tuesday 1st April 2025</td>
      <td><ul><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li><li>6</li><li>7</li></ul></td>
    </tr>
    <tr><td>Not a date</td><td><ul><li>1</li></ul></td></tr>
    <tr><td>Monday 3rd March 2025</td><td><ul><li>1</li><li>x</li></ul></td></tr>
    <tr><td>Sunday 2nd March 2025</td><td><ul><li>1</li><li>1</li><li>3</li><li>4</li><li>5</li><li>6</li><li>7</li></ul></td></tr>
  </tbody>
</table>"#;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_results_url() {
        assert_eq!(
            results_url(Session::Lunchtime, 2025),
            "https://za.lottonumbers.com/uk-49s-lunchtime/results/2025"
        );
    }

    #[test]
    fn test_parse_date_with_ordinal() {
        let page = ResultsPage::new().unwrap();
        assert_eq!(page.parse_date("Thursday 26th March 2025"), Some(date("2025-03-26")));
        assert_eq!(page.parse_date("<b>Saturday</b> 22nd  February 2025"), Some(date("2025-02-22")));
        assert_eq!(page.parse_date("Monday 1st 2025"), None);
    }

    #[test]
    fn test_parse_page() {
        let page = ResultsPage::new().unwrap();
        let outcome = page.parse(PAGE, Session::Teatime);
        assert_eq!(outcome.draws.len(), 2);
        assert_eq!(outcome.skipped, 3);

        let first = &outcome.draws[0];
        assert_eq!(first.date, date("2025-03-26"));
        assert_eq!(first.session, Session::Teatime);
        assert_eq!(first.numbers, [3, 11, 19, 24, 37, 45, 8]);
        assert_eq!(outcome.draws[1].date, date("2025-04-01"));
    }

    #[test]
    fn test_cutoff_after_lunchtime_keeps_same_day() {
        let latest = Draw {
            date: date("2025-03-26"),
            session: Session::Lunchtime,
            numbers: [1, 2, 3, 4, 5, 6, 7],
        };
        let scraped = vec![
            Draw { date: date("2025-03-25"), ..latest },
            Draw { date: date("2025-03-26"), session: Session::Teatime, ..latest },
            Draw { date: date("2025-03-27"), ..latest },
        ];
        let kept = apply_cutoff(scraped, Some(&latest));
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.date >= latest.date));
    }

    #[test]
    fn test_cutoff_after_teatime_starts_next_day() {
        let latest = Draw {
            date: date("2025-03-26"),
            session: Session::Teatime,
            numbers: [1, 2, 3, 4, 5, 6, 7],
        };
        let scraped = vec![
            Draw { date: date("2025-03-26"), ..latest },
            Draw { date: date("2025-03-27"), session: Session::Lunchtime, ..latest },
        ];
        let kept = apply_cutoff(scraped, Some(&latest));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, date("2025-03-27"));

        assert_eq!(apply_cutoff(kept.clone(), None), kept);
    }
}
