use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;

pub fn run(args: StatusArgs) -> Result<()> {
    if !args.db_path.exists() {
        warn!(path = %args.db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(&args.db_path)
        .with_context(|| format!("failed to open {}", args.db_path.display()))?;

    let wines = query_count(&connection, "SELECT COUNT(*) FROM wines")?;
    let slots_total = query_count(&connection, "SELECT COUNT(*) FROM slots")?;
    let slots_occupied =
        query_count(&connection, "SELECT COUNT(*) FROM slots WHERE wine_id IS NOT NULL")?;
    let reduce_now = query_count(&connection, "SELECT COUNT(*) FROM reduce_now")?;
    let pairing_rules = query_count(&connection, "SELECT COUNT(*) FROM pairing_rules")?;

    info!(
        path = %args.db_path.display(),
        wines,
        slots_total,
        slots_occupied,
        slots_free = slots_total - slots_occupied,
        reduce_now,
        pairing_rules,
        "database status"
    );

    Ok(())
}

fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
