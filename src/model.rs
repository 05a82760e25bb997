use serde::{Deserialize, Serialize};

/// One row of the inventory spreadsheet, regardless of whether it came from
/// the xlsx workbook or a csv export of it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryRow {
    pub style: Option<String>,
    pub colour: Option<String>,
    pub wine_name: Option<String>,
    pub vintage: Option<i64>,
    pub vivino_rating: Option<f64>,
    #[serde(rename = "netherlands_price_eur")]
    pub price_eur: Option<f64>,
    pub location: Option<String>,
    pub loc_end: Option<String>,
    pub bottle_count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReduceNowRow {
    pub wine_name: String,
    pub vintage: Option<i64>,
    pub priority: i64,
    pub reduce_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLevel {
    Primary,
    Good,
    Fallback,
}

impl MatchLevel {
    pub fn parse(cell: &str) -> Option<Self> {
        match cell.trim() {
            "primary" => Some(Self::Primary),
            "good" => Some(Self::Good),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Good => "good",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFileEntry {
    pub filename: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigratePaths {
    pub data_dir: String,
    pub db_path: String,
    pub inventory_path: String,
    pub reduce_now_path: String,
    pub pairing_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrateCounts {
    pub slots_generated: usize,
    pub wines_imported: usize,
    pub slots_filled: usize,
    pub rows_without_location: usize,
    pub reduce_now_imported: usize,
    pub reduce_now_skipped: usize,
    pub pairing_rules_imported: usize,
    pub wines_total: i64,
    pub slots_occupied: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrateRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: MigratePaths,
    pub counts: MigrateCounts,
    pub source_files: Vec<SourceFileEntry>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Successful extraction payload, one entry per PDF page plus the joined text.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub success: bool,
    pub method: String,
    pub total_pages: usize,
    pub pages: Vec<PageText>,
    pub full_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityReport {
    pub available: bool,
    pub has_pdftotext: bool,
    pub has_pdftoppm: bool,
    pub has_tesseract: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
