use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::{ExtractArgs, OutputFormat};
use crate::model::{ExtractionReport, PageText};

mod capabilities;
mod ocr;
mod text_layer;
#[cfg(test)]
mod tests;

use capabilities::ExtractionTools;
use ocr::OcrStrategy;
use text_layer::TextLayerStrategy;

const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";

/// One backend in the fallback chain. Strategies are tried in order until a
/// result passes the text-length acceptance predicate.
pub(crate) trait ExtractionStrategy {
    fn name(&self) -> &'static str;
    fn available(&self, tools: ExtractionTools) -> bool;
    fn extract(&self, pdf_path: &Path) -> Result<ExtractionReport>;
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let tools = ExtractionTools::probe();

    if args.check {
        let report = tools.report();
        println!("{}", serde_json::to_string(&report)?);
        if !tools.any_available() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        bail!("a PDF path (or base64 payload with --base64) is required");
    };

    let handle = match materialize_input(input, args.base64) {
        Ok(handle) => handle,
        Err(err) => return fail(&args.output, &format!("{err:#}")),
    };

    if !args.base64 && !handle.path().exists() {
        return fail(
            &args.output,
            &format!("file not found: {}", handle.path().display()),
        );
    }

    if !tools.any_available() {
        return fail(
            &args.output,
            "neither pdftotext nor pdftoppm+tesseract is installed",
        );
    }

    let strategies = strategy_chain(&args);
    match run_strategies(&strategies, tools, handle.path(), args.min_text_chars) {
        Ok(report) => emit(&args.output, &report),
        Err(err) => fail(&args.output, &format!("{err:#}")),
    }
}

fn strategy_chain(args: &ExtractArgs) -> Vec<Box<dyn ExtractionStrategy>> {
    let mut chain: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
    if !args.force_ocr {
        chain.push(Box::new(TextLayerStrategy));
    }
    chain.push(Box::new(OcrStrategy::new(&args.ocr_lang, args.ocr_dpi)));
    chain
}

/// Tries each available strategy in order. A result whose trimmed text clears
/// the threshold wins outright; a thin result is retained so it can still be
/// returned when every later backend fails or is missing.
pub(crate) fn run_strategies(
    strategies: &[Box<dyn ExtractionStrategy>],
    tools: ExtractionTools,
    pdf_path: &Path,
    min_text_chars: usize,
) -> Result<ExtractionReport> {
    let mut thin_result: Option<ExtractionReport> = None;

    for strategy in strategies {
        if !strategy.available(tools) {
            info!(method = strategy.name(), "backend unavailable; skipping");
            continue;
        }

        match strategy.extract(pdf_path) {
            Ok(report) => {
                let text_length = report.full_text.trim().chars().count();
                if text_length > min_text_chars {
                    info!(method = %report.method, chars = text_length, "extraction accepted");
                    return Ok(report);
                }
                info!(
                    method = %report.method,
                    chars = text_length,
                    "little text extracted; trying next backend"
                );
                thin_result.get_or_insert(report);
            }
            Err(err) => {
                warn!(method = strategy.name(), error = %err, "extraction backend failed");
            }
        }
    }

    thin_result.context("no PDF text extraction method available")
}

pub(crate) fn report_from_pages(method: &str, page_texts: Vec<String>) -> ExtractionReport {
    let full_text = page_texts.join(PAGE_BREAK);
    let pages: Vec<PageText> = page_texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| PageText {
            page_number: index + 1,
            text,
        })
        .collect();

    ExtractionReport {
        success: true,
        method: method.to_string(),
        total_pages: pages.len(),
        pages,
        full_text,
    }
}

fn emit(output: &OutputFormat, report: &ExtractionReport) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => println!("{}", report.full_text),
    }
    Ok(())
}

fn fail(output: &OutputFormat, error: &str) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "success": false, "error": error })
            );
        }
        OutputFormat::Text => println!("Error: {error}"),
    }
    std::process::exit(1)
}

enum InputHandle {
    File(PathBuf),
    Temp(TempPdf),
}

impl InputHandle {
    fn path(&self) -> &Path {
        match self {
            Self::File(path) => path,
            Self::Temp(temp) => &temp.0,
        }
    }
}

/// Decoded base64 payloads land in a temp file that is removed on drop.
struct TempPdf(PathBuf);

impl Drop for TempPdf {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

fn materialize_input(input: &str, is_base64: bool) -> Result<InputHandle> {
    if !is_base64 {
        return Ok(InputHandle::File(PathBuf::from(input)));
    }

    let bytes = STANDARD
        .decode(input.trim().as_bytes())
        .context("failed to decode base64 payload")?;

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let path = std::env::temp_dir().join(format!(
        "cellar_extract_{}_{}.pdf",
        std::process::id(),
        stamp
    ));
    fs::write(&path, bytes)
        .with_context(|| format!("failed to write decoded payload to {}", path.display()))?;

    Ok(InputHandle::Temp(TempPdf(path)))
}
