use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

use crate::model::ExtractionReport;

use super::capabilities::ExtractionTools;
use super::{ExtractionStrategy, report_from_pages};

/// Reads the PDF's embedded text layer via pdftotext. Fast, but yields next
/// to nothing for scanned documents.
pub(super) struct TextLayerStrategy;

impl ExtractionStrategy for TextLayerStrategy {
    fn name(&self) -> &'static str {
        "text_layer"
    }

    fn available(&self, tools: ExtractionTools) -> bool {
        tools.text_layer_available()
    }

    fn extract(&self, pdf_path: &Path) -> Result<ExtractionReport> {
        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(pdf_path)
            .arg("-")
            .output()
            .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let pages = pages_from_pdftotext_output(&raw);

        Ok(report_from_pages(self.name(), pages))
    }
}

/// pdftotext separates pages with form feeds; trailing empty pages are noise
/// from the final separator.
pub(super) fn pages_from_pdftotext_output(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}
