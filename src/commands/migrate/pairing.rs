use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::info;

use crate::model::MatchLevel;

/// Imports the pairing matrix: rows are food signals, the header row lists
/// wine-style buckets, and only cells holding a recognised match level become
/// rules. Blank or unrecognised cells are ignored.
pub(super) fn import_pairing_matrix(connection: &Connection, path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open pairing matrix csv: {}", path.display()))?;

    let mut records = reader.records();
    let header = records
        .next()
        .with_context(|| format!("pairing matrix is empty: {}", path.display()))?
        .with_context(|| format!("malformed pairing matrix header in {}", path.display()))?;

    let style_buckets: Vec<String> = header
        .iter()
        .skip(1)
        .map(|name| name.trim().to_string())
        .collect();

    let mut statement = connection.prepare(
        "INSERT OR REPLACE INTO pairing_rules (food_signal, wine_style_bucket, match_level)
         VALUES (?1, ?2, ?3)",
    )?;

    let mut rules_imported = 0;
    for record in records {
        let record =
            record.with_context(|| format!("malformed pairing matrix row in {}", path.display()))?;

        let Some(food_signal) = record.get(0).map(str::trim).filter(|signal| !signal.is_empty())
        else {
            continue;
        };

        for (index, bucket) in style_buckets.iter().enumerate() {
            let Some(level) = record.get(index + 1).and_then(MatchLevel::parse) else {
                continue;
            };
            statement.execute(params![food_signal, bucket, level.as_str()])?;
            rules_imported += 1;
        }
    }

    info!(rules = rules_imported, "pairing matrix import complete");

    Ok(rules_imported)
}
