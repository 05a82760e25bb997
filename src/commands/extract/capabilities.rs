use std::process::Command;

use crate::model::CapabilityReport;

/// Availability of the external extraction tools, probed once at startup and
/// handed to the dispatcher rather than consulted ambiently.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExtractionTools {
    pub pdftotext: bool,
    pub pdftoppm: bool,
    pub tesseract: bool,
}

impl ExtractionTools {
    pub fn probe() -> Self {
        Self {
            pdftotext: command_available("pdftotext", &["-v"]),
            pdftoppm: command_available("pdftoppm", &["-v"]),
            tesseract: command_available("tesseract", &["--version"]),
        }
    }

    pub fn text_layer_available(self) -> bool {
        self.pdftotext
    }

    pub fn ocr_available(self) -> bool {
        self.pdftoppm && self.tesseract
    }

    pub fn any_available(self) -> bool {
        self.text_layer_available() || self.ocr_available()
    }

    pub fn report(self) -> CapabilityReport {
        CapabilityReport {
            available: self.any_available(),
            has_pdftotext: self.pdftotext,
            has_pdftoppm: self.pdftoppm,
            has_tesseract: self.tesseract,
            error: (!self.any_available())
                .then(|| "neither pdftotext nor pdftoppm+tesseract is installed".to_string()),
        }
    }
}

fn command_available(program: &str, args: &[&str]) -> bool {
    Command::new(program).args(args).output().is_ok()
}
