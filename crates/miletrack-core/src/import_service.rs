//! Bulk import of historical readings pasted from a spreadsheet.
//!
//! Each line holds a `DD/MM/YYYY` date and a mileage separated by a tab.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use miletrack_domain::{Garage, Reading};

use crate::{reading_service::ReadingService, time::Clock, CoreError};

const IMPORT_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReading {
    /// 1-based line number in the pasted text.
    pub line: usize,
    pub date: NaiveDate,
    pub mileage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    pub line: usize,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedImport {
    pub readings: Vec<ParsedReading>,
    pub issues: Vec<ImportIssue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    /// Parsed readings offered for import.
    pub total: usize,
    /// Lines rejected while parsing.
    pub rejected_lines: usize,
}

pub struct ImportService;

impl ImportService {
    /// Parses pasted text. Blank lines and lines without both fields are skipped
    /// silently; lines with an unreadable date or mileage are reported.
    pub fn parse(text: &str) -> ParsedImport {
        let mut parsed = ParsedImport::default();
        for (index, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let line = index + 1;
            let mut fields = raw.split('\t').map(str::trim);
            let (Some(date_text), Some(mileage_text)) = (fields.next(), fields.next()) else {
                continue;
            };
            if date_text.is_empty() || mileage_text.is_empty() {
                continue;
            }
            let issue = |reason: String| ImportIssue {
                line,
                content: raw.trim_end().to_string(),
                reason,
            };
            let date = match NaiveDate::parse_from_str(date_text, IMPORT_DATE_FORMAT) {
                Ok(date) => date,
                Err(_) => {
                    parsed
                        .issues
                        .push(issue(format!("invalid date `{}` (use DD/MM/YYYY)", date_text)));
                    continue;
                }
            };
            match parse_mileage(mileage_text) {
                Some(mileage) => parsed.readings.push(ParsedReading {
                    line,
                    date,
                    mileage,
                }),
                None => parsed
                    .issues
                    .push(issue(format!("invalid mileage `{}`", mileage_text))),
            }
        }
        parsed
    }

    /// Adds every parsed reading to `car_id`. Individual failures are counted, not fatal.
    pub fn apply(
        garage: &mut Garage,
        car_id: Uuid,
        parsed: &ParsedImport,
        clock: &dyn Clock,
    ) -> Result<ImportReport, CoreError> {
        if garage.car(car_id).is_none() {
            return Err(CoreError::CarNotFound(car_id.to_string()));
        }
        let mut report = ImportReport {
            total: parsed.readings.len(),
            rejected_lines: parsed.issues.len(),
            ..ImportReport::default()
        };
        for issue in &parsed.issues {
            warn!(line = issue.line, reason = %issue.reason, "skipping import line");
        }
        for entry in &parsed.readings {
            let reading = Reading::new(car_id, entry.date, entry.mileage).recorded_at(clock.now());
            match ReadingService::add(garage, reading) {
                Ok(_) => report.imported += 1,
                Err(err) => {
                    warn!(line = entry.line, error = %err, "failed to import reading");
                    report.failed += 1;
                }
            }
        }
        info!(
            car = %car_id,
            imported = report.imported,
            failed = report.failed,
            "import finished"
        );
        Ok(report)
    }
}

/// Whole miles from the leading digits of `text` once thousands separators are
/// dropped. Anything after the digits (a fraction, a unit) is ignored.
fn parse_mileage(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let end = cleaned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(cleaned.len());
    let digits = &cleaned[..end];
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
