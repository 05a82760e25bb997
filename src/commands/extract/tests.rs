use std::path::{Path, PathBuf};

use anyhow::anyhow;

use super::ocr::sort_page_images;
use super::text_layer::pages_from_pdftotext_output;
use super::*;

fn no_tools() -> ExtractionTools {
    ExtractionTools {
        pdftotext: false,
        pdftoppm: false,
        tesseract: false,
    }
}

struct FixedText {
    method: &'static str,
    text: &'static str,
}

impl ExtractionStrategy for FixedText {
    fn name(&self) -> &'static str {
        self.method
    }

    fn available(&self, _tools: ExtractionTools) -> bool {
        true
    }

    fn extract(&self, _pdf_path: &Path) -> anyhow::Result<ExtractionReport> {
        Ok(report_from_pages(self.method, vec![self.text.to_string()]))
    }
}

struct FailingBackend;

impl ExtractionStrategy for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn available(&self, _tools: ExtractionTools) -> bool {
        true
    }

    fn extract(&self, _pdf_path: &Path) -> anyhow::Result<ExtractionReport> {
        Err(anyhow!("backend exploded"))
    }
}

struct UnavailableBackend;

impl ExtractionStrategy for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn available(&self, _tools: ExtractionTools) -> bool {
        false
    }

    fn extract(&self, _pdf_path: &Path) -> anyhow::Result<ExtractionReport> {
        unreachable!("unavailable backends must never be invoked")
    }
}

#[test]
fn dispatcher_accepts_first_result_over_threshold() {
    let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
        Box::new(FixedText {
            method: "text_layer",
            text: "plenty of extractable text on this page",
        }),
        Box::new(FailingBackend),
    ];

    let report = run_strategies(&strategies, no_tools(), Path::new("unused.pdf"), 10)
        .expect("first backend accepted");
    assert_eq!(report.method, "text_layer");
}

#[test]
fn dispatcher_falls_through_when_text_is_below_threshold() {
    let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
        Box::new(FixedText {
            method: "text_layer",
            text: "thin",
        }),
        Box::new(FixedText {
            method: "ocr",
            text: "a much longer block of recognised page text",
        }),
    ];

    let report = run_strategies(&strategies, no_tools(), Path::new("unused.pdf"), 10)
        .expect("second backend accepted");
    assert_eq!(report.method, "ocr");
}

#[test]
fn dispatcher_returns_thin_result_when_later_backends_fail() {
    let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
        Box::new(FixedText {
            method: "text_layer",
            text: "thin",
        }),
        Box::new(FailingBackend),
    ];

    let report = run_strategies(&strategies, no_tools(), Path::new("unused.pdf"), 10)
        .expect("thin result still returned");
    assert_eq!(report.method, "text_layer");
    assert_eq!(report.full_text, "thin");
}

#[test]
fn dispatcher_errors_when_no_backend_is_available() {
    let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![Box::new(UnavailableBackend)];

    let err = run_strategies(&strategies, no_tools(), Path::new("unused.pdf"), 10)
        .expect_err("no backend to run");
    assert!(err.to_string().contains("no PDF text extraction method"));
}

#[test]
fn pages_split_on_form_feed_and_drop_trailing_blanks() {
    let raw = "first page text\u{000C}second\u{0000} page\u{000C}\n\u{000C}";

    let pages = pages_from_pdftotext_output(raw);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0], "first page text");
    assert_eq!(pages[1], "second page");
}

#[test]
fn page_images_sort_numerically_not_lexically() {
    let mut paths = vec![
        PathBuf::from("/tmp/x/page-10.png"),
        PathBuf::from("/tmp/x/page-2.png"),
        PathBuf::from("/tmp/x/page-1.png"),
    ];

    sort_page_images(&mut paths);

    assert_eq!(paths[0], PathBuf::from("/tmp/x/page-1.png"));
    assert_eq!(paths[1], PathBuf::from("/tmp/x/page-2.png"));
    assert_eq!(paths[2], PathBuf::from("/tmp/x/page-10.png"));
}

#[test]
fn report_numbers_pages_and_joins_full_text() {
    let report = report_from_pages(
        "text_layer",
        vec!["page one".to_string(), "page two".to_string()],
    );

    assert!(report.success);
    assert_eq!(report.total_pages, 2);
    assert_eq!(report.pages[0].page_number, 1);
    assert_eq!(report.pages[1].page_number, 2);
    assert_eq!(
        report.full_text,
        "page one\n\n--- Page Break ---\n\npage two"
    );
}
