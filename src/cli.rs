use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "cellar",
    version,
    about = "Wine cellar migration and PDF text-extraction tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// One-time import of inventory, reduce-now and pairing data into sqlite
    Migrate(MigrateArgs),
    /// Extract text from a PDF via the text layer, falling back to OCR
    Extract(ExtractArgs),
    /// Report row counts for an existing cellar database
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Defaults to <data-dir>/cellar.db
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Defaults to <data-dir>/inventory_layout.xlsx; a .csv export also works
    #[arg(long)]
    pub inventory_path: Option<PathBuf>,

    /// Defaults to <data-dir>/reduce_now_priority.csv
    #[arg(long)]
    pub reduce_now_path: Option<PathBuf>,

    /// Defaults to <data-dir>/pairing_matrix.csv
    #[arg(long)]
    pub pairing_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    /// Keep an existing database file instead of starting from scratch
    #[arg(long, default_value_t = false)]
    pub keep_existing_db: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Path to a PDF file, or a base64-encoded PDF payload with --base64
    pub input: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Probe external tool availability and exit 0/1
    #[arg(long, default_value_t = false)]
    pub check: bool,

    /// Skip the text layer and go straight to OCR
    #[arg(long, default_value_t = false)]
    pub force_ocr: bool,

    /// Treat the positional input as a base64-encoded PDF payload
    #[arg(long, default_value_t = false)]
    pub base64: bool,

    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    #[arg(long, default_value_t = 200)]
    pub ocr_dpi: u32,

    /// Minimum trimmed text length for a backend result to be accepted
    #[arg(long, default_value_t = 100)]
    pub min_text_chars: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data/cellar.db")]
    pub db_path: PathBuf,
}
