use anyhow::{Context, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

use crate::models::{validate_numbers, Draw, Session};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    date     TEXT NOT NULL,
    session  TEXT NOT NULL,
    n1       INTEGER NOT NULL,
    n2       INTEGER NOT NULL,
    n3       INTEGER NOT NULL,
    n4       INTEGER NOT NULL,
    n5       INTEGER NOT NULL,
    n6       INTEGER NOT NULL,
    n7       INTEGER NOT NULL,
    PRIMARY KEY (date, session)
);
";

const SELECT_DRAWS: &str = "SELECT date, session, n1, n2, n3, n4, n5, n6, n7 FROM draws";

// 'teatime' > 'lunchtime' : l'ordre lexical suffit pour l'ordre canonique.
const CANONICAL_ORDER: &str = "ORDER BY date DESC, session DESC";

impl ToSql for Session {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Session {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("uk49s.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let n = &draw.numbers;
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (date, session, n1, n2, n3, n4, n5, n6, n7)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![draw.date, draw.session, n[0], n[1], n[2], n[3], n[4], n[5], n[6]],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Les numéros relus sont revalidés : une ligne modifiée à la main ne doit pas
/// atteindre l'analyse.
fn row_to_draw(row: &Row<'_>) -> rusqlite::Result<Draw> {
    let numbers = [
        row.get::<_, u8>(2)?,
        row.get::<_, u8>(3)?,
        row.get::<_, u8>(4)?,
        row.get::<_, u8>(5)?,
        row.get::<_, u8>(6)?,
        row.get::<_, u8>(7)?,
        row.get::<_, u8>(8)?,
    ];
    validate_numbers(&numbers)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, e.into()))?;
    Ok(Draw {
        date: row.get(0)?,
        session: row.get(1)?,
        numbers,
    })
}

pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAWS} {CANONICAL_ORDER}"))?;
    let draws = stmt
        .query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAWS} {CANONICAL_ORDER} LIMIT ?1"))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn fetch_session_draws(conn: &Connection, session: Session) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("{SELECT_DRAWS} WHERE session = ?1 {CANONICAL_ORDER}"))?;
    let draws = stmt
        .query_map([session], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn latest_draw(conn: &Connection) -> Result<Option<Draw>> {
    let draw = conn
        .query_row(&format!("{SELECT_DRAWS} {CANONICAL_ORDER} LIMIT 1"), [], row_to_draw)
        .optional()?;
    Ok(draw)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_draw(date: &str, session: Session) -> Draw {
        Draw {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            session,
            numbers: [1, 2, 3, 4, 5, 6, 7],
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw("2024-01-01", Session::Lunchtime)).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();

        let inserted = insert_draw(&conn, &test_draw("2024-01-01", Session::Lunchtime)).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw("2024-01-01", Session::Lunchtime)).unwrap();
        assert!(!inserted);
        // Même date, autre session : tirage distinct
        let inserted = insert_draw(&conn, &test_draw("2024-01-01", Session::Teatime)).unwrap();
        assert!(inserted);
        assert_eq!(count_draws(&conn).unwrap(), 2);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();

        insert_draw(&conn, &test_draw("2024-01-01", Session::Teatime)).unwrap();
        insert_draw(&conn, &test_draw("2024-01-05", Session::Lunchtime)).unwrap();
        insert_draw(&conn, &test_draw("2024-01-03", Session::Lunchtime)).unwrap();
        insert_draw(&conn, &test_draw("2024-01-05", Session::Teatime)).unwrap();

        let draws = fetch_all_draws(&conn).unwrap();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[0].date.to_string(), "2024-01-05");
        assert_eq!(draws[0].session, Session::Teatime);
        assert_eq!(draws[1].session, Session::Lunchtime);
        assert_eq!(draws[2].date.to_string(), "2024-01-03");
        assert_eq!(draws[3].date.to_string(), "2024-01-01");

        let last = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[..], draws[..2]);
    }

    #[test]
    fn test_fetch_session_and_latest() {
        let conn = memory_db();
        assert!(latest_draw(&conn).unwrap().is_none());

        insert_draw(&conn, &test_draw("2024-01-01", Session::Teatime)).unwrap();
        insert_draw(&conn, &test_draw("2024-01-02", Session::Lunchtime)).unwrap();

        let teatime = fetch_session_draws(&conn, Session::Teatime).unwrap();
        assert_eq!(teatime.len(), 1);
        assert_eq!(teatime[0].session, Session::Teatime);

        let latest = latest_draw(&conn).unwrap().unwrap();
        assert_eq!(latest.date.to_string(), "2024-01-02");
        assert_eq!(latest.numbers, [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_corrupted_row_rejected() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw("2024-01-01", Session::Lunchtime)).unwrap();
        conn.execute(
            "INSERT INTO draws (date, session, n1, n2, n3, n4, n5, n6, n7)
             VALUES ('2024-01-02', 'teatime', 1, 2, 3, 4, 5, 6, 64)",
            [],
        )
        .unwrap();

        assert!(fetch_all_draws(&conn).is_err());
        assert!(latest_draw(&conn).is_err());
        // la session saine reste lisible
        assert_eq!(fetch_session_draws(&conn, Session::Lunchtime).unwrap().len(), 1);
    }
}
