use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use crate::model::ReduceNowRow;

#[derive(Debug, Default)]
pub(super) struct ReduceNowCounts {
    pub imported: usize,
    pub skipped: usize,
}

/// Imports reduce-now priorities, matching each row to a wine by name and
/// vintage (NULL vintages compare equal). Rows with no matching wine are
/// logged and skipped; the rest of the import continues.
pub(super) fn import_reduce_now(
    connection: &Connection,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<ReduceNowCounts> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open reduce-now csv: {}", path.display()))?;

    let mut counts = ReduceNowCounts::default();

    for record in reader.deserialize::<ReduceNowRow>() {
        let row = record
            .with_context(|| format!("malformed reduce-now row in {}", path.display()))?;

        let wine_id: Option<i64> = connection
            .query_row(
                "SELECT id FROM wines
                 WHERE wine_name = ?1 AND (vintage = ?2 OR (vintage IS NULL AND ?2 IS NULL))",
                params![row.wine_name, row.vintage],
                |found| found.get(0),
            )
            .optional()?;

        let Some(wine_id) = wine_id else {
            warn!(
                wine_name = %row.wine_name,
                vintage = ?row.vintage,
                "no wine matches reduce-now row; skipping"
            );
            warnings.push(format!(
                "reduce-now row skipped: no wine named '{}' ({:?})",
                row.wine_name, row.vintage
            ));
            counts.skipped += 1;
            continue;
        };

        connection.execute(
            "INSERT OR REPLACE INTO reduce_now (wine_id, priority, reduce_reason)
             VALUES (?1, ?2, ?3)",
            params![wine_id, row.priority, row.reduce_reason],
        )?;
        counts.imported += 1;
    }

    info!(
        imported = counts.imported,
        skipped = counts.skipped,
        "reduce-now import complete"
    );

    Ok(counts)
}
