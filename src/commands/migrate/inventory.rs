use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::model::InventoryRow;

use super::location::{LocationResolver, normalise_colour};

#[derive(Debug, Default)]
pub(super) struct InventoryCounts {
    pub wines_imported: usize,
    pub slots_filled: usize,
    pub rows_without_location: usize,
}

/// Imports the inventory sheet: one wines row per record, then occupancy for
/// the resolved location range, capped at the record's bottle count.
pub(super) fn import_inventory(
    connection: &Connection,
    path: &Path,
    resolver: &LocationResolver,
    warnings: &mut Vec<String>,
) -> Result<InventoryCounts> {
    let rows = load_rows(path)?;
    let mut counts = InventoryCounts::default();

    for row in rows {
        let Some(wine_name) = row.wine_name.as_deref().map(str::trim).filter(|name| !name.is_empty())
        else {
            warn!("inventory row without wine_name; skipping");
            warnings.push("inventory row without wine_name skipped".to_string());
            continue;
        };

        let colour = normalise_colour(row.colour.as_deref().unwrap_or(""));
        connection.execute(
            "INSERT INTO wines (style, colour, wine_name, vintage, vivino_rating, price_eur)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.style,
                colour,
                wine_name,
                row.vintage,
                row.vivino_rating,
                row.price_eur
            ],
        )?;
        let wine_id = connection.last_insert_rowid();
        counts.wines_imported += 1;

        let Some(location) = row.location.as_deref().map(str::trim).filter(|code| !code.is_empty())
        else {
            counts.rows_without_location += 1;
            continue;
        };

        let locations = resolver.resolve(location, row.loc_end.as_deref());
        let bottle_count = row
            .bottle_count
            .with_context(|| format!("bottle_count missing for located wine '{wine_name}'"))?;

        let take = locations.len().min(bottle_count.max(0) as usize);
        counts.slots_filled += assign_slots(connection, wine_id, &locations[..take])?;
    }

    info!(
        wines = counts.wines_imported,
        slots_filled = counts.slots_filled,
        "inventory import complete"
    );

    Ok(counts)
}

/// Sets each listed slot's occupant by exact location-code match. Codes that
/// match no pre-generated slot are skipped, which tolerates transcription
/// typos in the source sheet.
pub(super) fn assign_slots(
    connection: &Connection,
    wine_id: i64,
    locations: &[String],
) -> Result<usize> {
    let mut statement = connection
        .prepare_cached("UPDATE slots SET wine_id = ?1 WHERE location_code = ?2")?;

    let mut filled = 0;
    for code in locations {
        let changed = statement.execute(params![wine_id, code])?;
        if changed == 0 {
            warn!(location_code = %code, wine_id, "location code matches no slot; skipping");
        }
        filled += changed;
    }

    Ok(filled)
}

fn load_rows(path: &Path) -> Result<Vec<InventoryRow>> {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" => read_workbook_rows(path),
        "csv" => read_csv_rows(path),
        other => bail!(
            "unsupported inventory format '{}': {}",
            other,
            path.display()
        ),
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<InventoryRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open inventory csv: {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<InventoryRow>() {
        let row = record
            .with_context(|| format!("malformed inventory row in {}", path.display()))?;
        rows.push(row);
    }

    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<InventoryRow>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open inventory workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("inventory workbook has no sheets: {}", path.display()))?
        .with_context(|| format!("failed to read first sheet of {}", path.display()))?;

    let mut sheet_rows = range.rows();
    let header = sheet_rows
        .next()
        .with_context(|| format!("inventory sheet is empty: {}", path.display()))?;

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| cell_string(cell).map(|name| (name.to_lowercase(), index)))
        .collect();

    let column = |name: &str| columns.get(name).copied();
    let wine_name_col = column("wine_name")
        .with_context(|| format!("inventory sheet lacks a wine_name column: {}", path.display()))?;

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let cell = |index: Option<usize>| index.and_then(|index| sheet_row.get(index));

        rows.push(InventoryRow {
            style: cell(column("style")).and_then(cell_string),
            colour: cell(column("colour")).and_then(cell_string),
            wine_name: sheet_row.get(wine_name_col).and_then(cell_string),
            vintage: cell(column("vintage")).and_then(cell_i64),
            vivino_rating: cell(column("vivino_rating")).and_then(cell_f64),
            price_eur: cell(column("netherlands_price_eur")).and_then(cell_f64),
            location: cell(column("location")).and_then(cell_string),
            loc_end: cell(column("loc_end")).and_then(cell_string),
            bottle_count: cell(column("bottle_count")).and_then(cell_i64),
        });
    }

    Ok(rows)
}

fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(value) => {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Float(value) => {
            if value.fract() == 0.0 {
                Some(format!("{}", *value as i64))
            } else {
                Some(value.to_string())
            }
        }
        Data::Int(value) => Some(value.to_string()),
        Data::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

fn cell_i64(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(value) => Some(*value),
        Data::Float(value) => Some(*value as i64),
        Data::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}
