use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::util::now_utc_string;

pub(super) const DB_SCHEMA_VERSION: &str = "0.1.0";

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wines (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          style TEXT,
          colour TEXT NOT NULL,
          wine_name TEXT NOT NULL,
          vintage INTEGER,
          vivino_rating REAL,
          price_eur REAL
        );

        CREATE TABLE IF NOT EXISTS slots (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          zone TEXT NOT NULL,
          location_code TEXT NOT NULL UNIQUE,
          row_num INTEGER NOT NULL,
          col_num INTEGER NOT NULL,
          wine_id INTEGER,
          FOREIGN KEY(wine_id) REFERENCES wines(id)
        );

        CREATE TABLE IF NOT EXISTS reduce_now (
          wine_id INTEGER PRIMARY KEY,
          priority INTEGER NOT NULL,
          reduce_reason TEXT,
          FOREIGN KEY(wine_id) REFERENCES wines(id)
        );

        CREATE TABLE IF NOT EXISTS pairing_rules (
          food_signal TEXT NOT NULL,
          wine_style_bucket TEXT NOT NULL,
          match_level TEXT NOT NULL,
          PRIMARY KEY (food_signal, wine_style_bucket)
        );

        CREATE INDEX IF NOT EXISTS idx_slots_wine ON slots(wine_id);
        CREATE INDEX IF NOT EXISTS idx_wines_name_vintage ON wines(wine_name, vintage);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

/// Pre-populates the fixed physical layout: fridge F1-F9 (F1-F4 on the top
/// shelf, F5-F9 below) and cellar rows 1-19 where row 1 has 7 columns and
/// every other row has 9. INSERT OR IGNORE keeps reruns idempotent.
pub(super) fn generate_slots(connection: &Connection) -> Result<usize> {
    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO slots (zone, location_code, row_num, col_num)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    let mut inserted = 0;

    for number in 1..=9_u32 {
        let row = if number <= 4 { 1 } else { 2 };
        inserted += statement.execute(rusqlite::params![
            "fridge",
            format!("F{number}"),
            row,
            number
        ])?;
    }

    for row in 1..=19_u32 {
        let max_col = if row == 1 { 7 } else { 9 };
        for col in 1..=max_col {
            inserted += statement.execute(rusqlite::params![
                "cellar",
                format!("R{row}C{col}"),
                row,
                col
            ])?;
        }
    }

    Ok(inserted)
}
