use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::info;

use crate::model::ExtractionReport;

use super::capabilities::ExtractionTools;
use super::{ExtractionStrategy, report_from_pages};

/// Rasterises the PDF with pdftoppm and runs tesseract over each page image.
/// Slow, but the only option for scanned documents.
pub(super) struct OcrStrategy {
    lang: String,
    dpi: u32,
}

impl OcrStrategy {
    pub fn new(lang: &str, dpi: u32) -> Self {
        Self {
            lang: lang.to_string(),
            dpi,
        }
    }
}

impl ExtractionStrategy for OcrStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn available(&self, tools: ExtractionTools) -> bool {
        tools.ocr_available()
    }

    fn extract(&self, pdf_path: &Path) -> Result<ExtractionReport> {
        let image_dir = rasterize_pages(pdf_path, self.dpi)?;
        let result = self.recognize_pages(&image_dir);
        let _ = fs::remove_dir_all(&image_dir);
        result
    }
}

impl OcrStrategy {
    fn recognize_pages(&self, image_dir: &Path) -> Result<ExtractionReport> {
        let mut image_paths = collect_page_images(image_dir)?;
        sort_page_images(&mut image_paths);

        if image_paths.is_empty() {
            bail!("pdftoppm produced no page images in {}", image_dir.display());
        }

        let mut pages = Vec::with_capacity(image_paths.len());
        for (index, image_path) in image_paths.iter().enumerate() {
            info!(page = index + 1, total = image_paths.len(), "running ocr");

            let output = Command::new("tesseract")
                .arg(image_path)
                .arg("stdout")
                .arg("-l")
                .arg(&self.lang)
                .output()
                .with_context(|| format!("failed to execute tesseract for {}", image_path.display()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "tesseract returned non-zero exit status for {}: {}",
                    image_path.display(),
                    stderr.trim()
                );
            }

            pages.push(
                String::from_utf8_lossy(&output.stdout)
                    .replace('\u{0000}', "")
                    .trim()
                    .to_string(),
            );
        }

        Ok(report_from_pages(self.name(), pages))
    }
}

fn rasterize_pages(pdf_path: &Path, dpi: u32) -> Result<PathBuf> {
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let image_dir = std::env::temp_dir().join(format!(
        "cellar_ocr_{}_{}",
        std::process::id(),
        stamp
    ));
    fs::create_dir_all(&image_dir)
        .with_context(|| format!("failed to create {}", image_dir.display()))?;

    let output = Command::new("pdftoppm")
        .arg("-r")
        .arg(dpi.to_string())
        .arg("-png")
        .arg(pdf_path)
        .arg(image_dir.join("page"))
        .output()
        .with_context(|| format!("failed to execute pdftoppm for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let _ = fs::remove_dir_all(&image_dir);
        bail!(
            "pdftoppm returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(image_dir)
}

fn collect_page_images(image_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(image_dir)
        .with_context(|| format!("failed to read {}", image_dir.display()))?;

    let mut image_paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", image_dir.display()))?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("png") {
            image_paths.push(path);
        }
    }

    Ok(image_paths)
}

/// pdftoppm numbers pages in the filename suffix; a lexical sort would put
/// page-10 before page-2.
pub(super) fn sort_page_images(image_paths: &mut [PathBuf]) {
    image_paths.sort_by_key(|path| page_number_of(path));
}

fn page_number_of(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('-').next())
        .and_then(|suffix| suffix.parse().ok())
        .unwrap_or(u32::MAX)
}
