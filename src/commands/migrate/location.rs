use anyhow::{Context, Result};
use regex::Regex;

/// Parses location codes (`F<n>` for the fridge, `R<row>C<col>` for the
/// cellar) and expands a start/end pair into the ordered codes it covers.
///
/// Malformed or cross-row ranges degrade to the single start code rather than
/// failing the import. Cross-row enumeration is intentionally unsupported;
/// the source sheets never span cellar rows.
pub struct LocationResolver {
    fridge_pattern: Regex,
    cellar_pattern: Regex,
}

impl LocationResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fridge_pattern: Regex::new(r"^F(\d+)$")
                .context("failed to compile fridge location regex")?,
            cellar_pattern: Regex::new(r"^R(\d+)C(\d+)$")
                .context("failed to compile cellar location regex")?,
        })
    }

    pub fn resolve(&self, start_code: &str, end_code: Option<&str>) -> Vec<String> {
        let start_code = start_code.trim();
        let Some(end_code) = end_code.map(str::trim).filter(|code| !code.is_empty()) else {
            return vec![start_code.to_string()];
        };

        if let (Some(start), Some(end)) = (
            self.fridge_number(start_code),
            self.fridge_number(end_code),
        ) {
            return (start..=end).map(|number| format!("F{number}")).collect();
        }

        // A fridge code paired with anything unparsable never becomes a span.
        if start_code.starts_with('F') || end_code.starts_with('F') {
            return vec![start_code.to_string()];
        }

        let (Some((start_row, start_col)), Some((end_row, end_col))) = (
            self.cellar_coordinates(start_code),
            self.cellar_coordinates(end_code),
        ) else {
            return vec![start_code.to_string()];
        };

        if start_row != end_row {
            return vec![start_code.to_string()];
        }

        (start_col..=end_col)
            .map(|col| format!("R{start_row}C{col}"))
            .collect()
    }

    fn fridge_number(&self, code: &str) -> Option<u32> {
        let captures = self.fridge_pattern.captures(code)?;
        captures.get(1)?.as_str().parse().ok()
    }

    fn cellar_coordinates(&self, code: &str) -> Option<(u32, u32)> {
        let captures = self.cellar_pattern.captures(code)?;
        let row = captures.get(1)?.as_str().parse().ok()?;
        let col = captures.get(2)?.as_str().parse().ok()?;
        Some((row, col))
    }
}

/// Maps free-text colour descriptions onto the four canonical buckets.
/// Exact matches are checked before the sparkling substrings so that
/// "rose" stays rose while "champagne rosé" lands in sparkling.
pub fn normalise_colour(colour: &str) -> &'static str {
    let colour = colour.trim().to_lowercase();
    match colour.as_str() {
        "red" => "red",
        "white" => "white",
        "rose" | "rosé" => "rose",
        other => {
            if ["sparkl", "prosecco", "champagne"]
                .iter()
                .any(|needle| other.contains(needle))
            {
                "sparkling"
            } else {
                "white"
            }
        }
    }
}
