use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::MigrateArgs;
use crate::model::{MigrateCounts, MigratePaths, MigrateRunManifest, SourceFileEntry};
use crate::util::{ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

mod inventory;
mod location;
mod pairing;
mod reduce_now;
mod schema;
#[cfg(test)]
mod tests;

use inventory::import_inventory;
use location::LocationResolver;
use pairing::import_pairing_matrix;
use reduce_now::import_reduce_now;
use schema::{DB_SCHEMA_VERSION, configure_connection, ensure_schema, generate_slots};

#[cfg(test)]
use inventory::assign_slots;
#[cfg(test)]
use location::normalise_colour;

pub fn run(args: MigrateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let data_dir = args.data_dir.clone();
    ensure_directory(&data_dir)?;

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| data_dir.join("cellar.db"));
    let inventory_path = args
        .inventory_path
        .clone()
        .unwrap_or_else(|| data_dir.join("inventory_layout.xlsx"));
    let reduce_now_path = args
        .reduce_now_path
        .clone()
        .unwrap_or_else(|| data_dir.join("reduce_now_priority.csv"));
    let pairing_path = args
        .pairing_path
        .clone()
        .unwrap_or_else(|| data_dir.join("pairing_matrix.csv"));
    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        data_dir
            .join("manifests")
            .join(format!("migrate_run_{}.json", utc_compact_string(started_ts)))
    });

    info!(data_dir = %data_dir.display(), run_id = %run_id, "starting migration");

    if !args.keep_existing_db && db_path.exists() {
        fs::remove_file(&db_path)
            .with_context(|| format!("failed to remove existing database: {}", db_path.display()))?;
        info!(path = %db_path.display(), "removed existing database");
    }

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let resolver = LocationResolver::new()?;
    let mut warnings = Vec::new();
    let mut counts = MigrateCounts::default();
    let mut source_files = Vec::new();

    // One linear pass, committed as a whole. A row-level failure aborts the
    // run with nothing partially applied.
    let tx = connection.transaction()?;

    counts.slots_generated = generate_slots(&tx)?;
    info!(slots = counts.slots_generated, "generated storage slots");

    if source_present(&inventory_path, "inventory", &mut warnings) {
        source_files.push(source_entry(&inventory_path)?);
        let inventory_counts = import_inventory(&tx, &inventory_path, &resolver, &mut warnings)?;
        counts.wines_imported = inventory_counts.wines_imported;
        counts.slots_filled = inventory_counts.slots_filled;
        counts.rows_without_location = inventory_counts.rows_without_location;
    }

    if source_present(&reduce_now_path, "reduce-now", &mut warnings) {
        source_files.push(source_entry(&reduce_now_path)?);
        let reduce_counts = import_reduce_now(&tx, &reduce_now_path, &mut warnings)?;
        counts.reduce_now_imported = reduce_counts.imported;
        counts.reduce_now_skipped = reduce_counts.skipped;
    }

    if source_present(&pairing_path, "pairing matrix", &mut warnings) {
        source_files.push(source_entry(&pairing_path)?);
        counts.pairing_rules_imported = import_pairing_matrix(&tx, &pairing_path)?;
    }

    tx.commit().context("failed to commit migration")?;

    counts.wines_total = count_rows(&connection, "SELECT COUNT(*) FROM wines")?;
    counts.slots_occupied =
        count_rows(&connection, "SELECT COUNT(*) FROM slots WHERE wine_id IS NOT NULL")?;

    info!(
        wines = counts.wines_total,
        bottles_stored = counts.slots_occupied,
        reduce_now = counts.reduce_now_imported,
        pairing_rules = counts.pairing_rules_imported,
        "migration completed"
    );

    let manifest = MigrateRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_migrate_command(&args),
        paths: MigratePaths {
            data_dir: data_dir.display().to_string(),
            db_path: db_path.display().to_string(),
            inventory_path: inventory_path.display().to_string(),
            reduce_now_path: reduce_now_path.display().to_string(),
            pairing_path: pairing_path.display().to_string(),
        },
        counts,
        source_files,
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;
    info!(path = %run_manifest_path.display(), "wrote migration run manifest");

    Ok(())
}

fn source_present(path: &Path, label: &str, warnings: &mut Vec<String>) -> bool {
    if path.exists() {
        info!(path = %path.display(), "importing {label}");
        return true;
    }

    warn!(path = %path.display(), "{label} file not found; skipping");
    warnings.push(format!("{label} file not found: {}", path.display()));
    false
}

fn source_entry(path: &Path) -> Result<SourceFileEntry> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

    Ok(SourceFileEntry {
        filename,
        sha256: sha256_file(path)?,
    })
}

fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

fn render_migrate_command(args: &MigrateArgs) -> String {
    let mut command = vec![
        "cellar".to_string(),
        "migrate".to_string(),
        "--data-dir".to_string(),
        args.data_dir.display().to_string(),
    ];

    let mut push_path = |flag: &str, value: &Option<PathBuf>| {
        if let Some(path) = value {
            command.push(flag.to_string());
            command.push(path.display().to_string());
        }
    };

    push_path("--db-path", &args.db_path);
    push_path("--inventory-path", &args.inventory_path);
    push_path("--reduce-now-path", &args.reduce_now_path);
    push_path("--pairing-path", &args.pairing_path);
    push_path("--run-manifest-path", &args.run_manifest_path);

    if args.keep_existing_db {
        command.push("--keep-existing-db".to_string());
    }

    command.join(" ")
}
