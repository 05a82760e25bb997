use std::io::Write;

use rusqlite::Connection;
use tempfile::Builder;

use super::*;

fn test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory db opens");
    ensure_schema(&connection).expect("schema applies");
    connection
}

fn resolver() -> LocationResolver {
    LocationResolver::new().expect("location regexes compile")
}

fn csv_fixture(contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("temp csv created");
    file.write_all(contents.as_bytes()).expect("fixture written");
    file
}

fn insert_wine(connection: &Connection, name: &str, vintage: Option<i64>) -> i64 {
    connection
        .execute(
            "INSERT INTO wines (style, colour, wine_name, vintage) VALUES ('Test', 'red', ?1, ?2)",
            rusqlite::params![name, vintage],
        )
        .expect("wine inserted");
    connection.last_insert_rowid()
}

#[test]
fn resolve_expands_fridge_range_inclusive() {
    let codes = resolver().resolve("F3", Some("F6"));
    assert_eq!(codes, vec!["F3", "F4", "F5", "F6"]);
}

#[test]
fn resolve_expands_same_row_cellar_range() {
    let codes = resolver().resolve("R10C1", Some("R10C3"));
    assert_eq!(codes, vec!["R10C1", "R10C2", "R10C3"]);
}

#[test]
fn resolve_degrades_cross_row_range_to_start_code() {
    let codes = resolver().resolve("R1C7", Some("R2C1"));
    assert_eq!(codes, vec!["R1C7"]);
}

#[test]
fn resolve_without_end_code_yields_single_code() {
    assert_eq!(resolver().resolve("F3", None), vec!["F3"]);
    assert_eq!(resolver().resolve("R4C2", Some("  ")), vec!["R4C2"]);
}

#[test]
fn resolve_fails_soft_on_malformed_codes() {
    assert_eq!(resolver().resolve("R1C2", Some("garbage")), vec!["R1C2"]);
    assert_eq!(resolver().resolve("F3", Some("Fx")), vec!["F3"]);
    assert_eq!(resolver().resolve("nonsense", Some("R2C1")), vec!["nonsense"]);
}

#[test]
fn normalise_colour_checks_exact_buckets_before_substrings() {
    assert_eq!(normalise_colour("red"), "red");
    assert_eq!(normalise_colour("  White "), "white");
    assert_eq!(normalise_colour("Rosé"), "rose");
    assert_eq!(normalise_colour("rose"), "rose");
    assert_eq!(normalise_colour("Champagne Rosé"), "sparkling");
    assert_eq!(normalise_colour("Prosecco"), "sparkling");
    assert_eq!(normalise_colour("sparkling white"), "sparkling");
    assert_eq!(normalise_colour("unknown"), "white");
    assert_eq!(normalise_colour(""), "white");
}

#[test]
fn generate_slots_builds_full_layout_and_is_idempotent() {
    let connection = test_connection();

    let first_run = generate_slots(&connection).expect("slots generate");
    assert_eq!(first_run, 178);

    let second_run = generate_slots(&connection).expect("rerun succeeds");
    assert_eq!(second_run, 0);

    let total: i64 = connection
        .query_row("SELECT COUNT(*) FROM slots", [], |row| row.get(0))
        .expect("count queried");
    assert_eq!(total, 178);

    let row1_cols: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM slots WHERE zone = 'cellar' AND row_num = 1",
            [],
            |row| row.get(0),
        )
        .expect("row 1 counted");
    assert_eq!(row1_cols, 7);

    let f9_row: i64 = connection
        .query_row(
            "SELECT row_num FROM slots WHERE location_code = 'F9'",
            [],
            |row| row.get(0),
        )
        .expect("F9 exists");
    assert_eq!(f9_row, 2);
}

#[test]
fn assign_slots_skips_unknown_codes_without_error() {
    let connection = test_connection();
    generate_slots(&connection).expect("slots generate");
    let wine_id = insert_wine(&connection, "Ghost Wine", Some(2019));

    let filled = assign_slots(&connection, wine_id, &["F99".to_string()]).expect("assign runs");
    assert_eq!(filled, 0);
}

#[test]
fn assign_slots_records_occupancy_by_exact_code() {
    let connection = test_connection();
    generate_slots(&connection).expect("slots generate");
    let wine_id = insert_wine(&connection, "Real Wine", Some(2020));

    let filled = assign_slots(
        &connection,
        wine_id,
        &["F1".to_string(), "F2".to_string()],
    )
    .expect("assign runs");
    assert_eq!(filled, 2);

    let occupant: i64 = connection
        .query_row(
            "SELECT wine_id FROM slots WHERE location_code = 'F2'",
            [],
            |row| row.get(0),
        )
        .expect("occupant queried");
    assert_eq!(occupant, wine_id);
}

#[test]
fn import_inventory_caps_assignment_at_bottle_count() {
    let connection = test_connection();
    generate_slots(&connection).expect("slots generate");

    let fixture = csv_fixture(
        "style,colour,wine_name,vintage,vivino_rating,netherlands_price_eur,location,loc_end,bottle_count\n\
         Rioja,red,Vina Real,2018,4.1,12.50,R10C1,R10C3,5\n\
         Cava,Champagne,Casa Bubbles,,4.0,9.95,F3,F6,2\n\
         Loose Bottle,white,No Home Yet,2022,,,,,\n",
    );

    let mut warnings = Vec::new();
    let counts = import_inventory(
        &connection,
        fixture.path(),
        &resolver(),
        &mut warnings,
    )
    .expect("inventory imports");

    assert_eq!(counts.wines_imported, 3);
    // R10C1-R10C3 fills all three; F3-F6 is capped at two bottles.
    assert_eq!(counts.slots_filled, 5);
    assert_eq!(counts.rows_without_location, 1);
    assert!(warnings.is_empty());

    let f5_occupant: Option<i64> = connection
        .query_row(
            "SELECT wine_id FROM slots WHERE location_code = 'F5'",
            [],
            |row| row.get(0),
        )
        .expect("F5 queried");
    assert_eq!(f5_occupant, None);

    let colour: String = connection
        .query_row(
            "SELECT colour FROM wines WHERE wine_name = 'Casa Bubbles'",
            [],
            |row| row.get(0),
        )
        .expect("colour queried");
    assert_eq!(colour, "sparkling");
}

#[test]
fn import_inventory_skips_rows_without_wine_name() {
    let connection = test_connection();
    generate_slots(&connection).expect("slots generate");

    let fixture = csv_fixture(
        "style,colour,wine_name,vintage,vivino_rating,netherlands_price_eur,location,loc_end,bottle_count\n\
         ,,,,,,,,\n\
         Pinot,red,Named Wine,2021,,,F1,,1\n",
    );

    let mut warnings = Vec::new();
    let counts = import_inventory(
        &connection,
        fixture.path(),
        &resolver(),
        &mut warnings,
    )
    .expect("inventory imports");

    assert_eq!(counts.wines_imported, 1);
    assert_eq!(counts.slots_filled, 1);
    assert_eq!(warnings.len(), 1);
}

#[test]
fn import_reduce_now_skips_unmatched_wines_and_continues() {
    let connection = test_connection();
    let wine_id = insert_wine(&connection, "Known Wine", Some(2015));
    insert_wine(&connection, "No Vintage Wine", None);

    let fixture = csv_fixture(
        "wine_name,vintage,priority,reduce_reason\n\
         Known Wine,2015,1,past peak\n\
         No Vintage Wine,,2,overstock\n\
         Missing Wine,2010,3,typo in sheet\n",
    );

    let mut warnings = Vec::new();
    let counts =
        import_reduce_now(&connection, fixture.path(), &mut warnings).expect("reduce-now imports");

    assert_eq!(counts.imported, 2);
    assert_eq!(counts.skipped, 1);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Missing Wine"));

    let priority: i64 = connection
        .query_row(
            "SELECT priority FROM reduce_now WHERE wine_id = ?1",
            [wine_id],
            |row| row.get(0),
        )
        .expect("priority queried");
    assert_eq!(priority, 1);
}

#[test]
fn import_pairing_matrix_keeps_only_recognised_levels() {
    let connection = test_connection();

    let fixture = csv_fixture(
        "food_signal,bold_red,crisp_white,sparkling\n\
         steak,primary,,fallback\n\
         oysters,n/a,primary,good\n\
         ,primary,primary,primary\n",
    );

    let rules = import_pairing_matrix(&connection, fixture.path()).expect("matrix imports");
    assert_eq!(rules, 4);

    let level: String = connection
        .query_row(
            "SELECT match_level FROM pairing_rules
             WHERE food_signal = 'oysters' AND wine_style_bucket = 'sparkling'",
            [],
            |row| row.get(0),
        )
        .expect("rule queried");
    assert_eq!(level, "good");
}
