//! Turning spreadsheet rows into typed records
//!
//! Column names are resolved once through a [`ColumnMapping`]. Bad cells
//! never abort a batch: an unreadable amount becomes zero and an unreadable
//! date drops the row, and both are reported as [`RowIssue`]s.

pub mod csv;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::tax::PaymentRecord;
use crate::traits::{Row, SpreadsheetReader};
use crate::types::Movement;
use crate::utils::{coerce_amount, parse_date, validate_column_name};

pub use self::csv::CsvSheetReader;

/// Which column holds each semantic field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub amount: String,
    pub description: Option<String>,
    pub payment_method: Option<String>,
    pub third_party: Option<String>,
}

impl ColumnMapping {
    /// Mapping with the two mandatory columns
    pub fn new(date: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            description: None,
            payment_method: None,
            third_party: None,
        }
    }

    pub fn with_description(mut self, column: impl Into<String>) -> Self {
        self.description = Some(column.into());
        self
    }

    pub fn with_payment_method(mut self, column: impl Into<String>) -> Self {
        self.payment_method = Some(column.into());
        self
    }

    pub fn with_third_party(mut self, column: impl Into<String>) -> Self {
        self.third_party = Some(column.into());
        self
    }

    fn columns(&self) -> impl Iterator<Item = &String> {
        [&self.date, &self.amount]
            .into_iter()
            .chain(self.description.iter())
            .chain(self.payment_method.iter())
            .chain(self.third_party.iter())
    }

    /// Check every mapped column exists in the sheet header
    pub fn validate(&self, headers: &[String]) -> Result<(), ImportError> {
        for column in self.columns() {
            validate_column_name(column).map_err(|e| ImportError::InvalidMapping(e.to_string()))?;
            if !headers.iter().any(|h| h == column) {
                return Err(ImportError::MissingColumn(column.clone()));
            }
        }
        Ok(())
    }
}

/// What happened to a row with a bad cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    /// Value replaced by zero, row kept
    CoercedToZero,
    /// Row left out of the batch
    Skipped,
}

/// A data-quality problem found while importing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    /// Spreadsheet line number, counting the header as line 1
    pub line: usize,
    pub column: String,
    pub value: String,
    pub message: String,
    pub action: IssueAction,
}

/// Imported records plus the issues met along the way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport<T> {
    pub records: Vec<T>,
    pub issues: Vec<RowIssue>,
}

impl<T> Default for ImportReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> ImportReport<T> {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.action == IssueAction::Skipped)
            .count()
    }
}

/// Fields shared by every importer
struct ParsedRow {
    date: chrono::NaiveDate,
    amount: BigDecimal,
}

fn cell<'r>(row: &'r Row, column: &str) -> &'r str {
    row.get(column).unwrap_or_default()
}

fn optional_cell(row: &Row, column: Option<&String>) -> Option<String> {
    column
        .map(|c| cell(row, c).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse date and amount for one row, recording issues
fn parse_row(
    mapping: &ColumnMapping,
    row: &Row,
    issues: &mut Vec<RowIssue>,
) -> Option<ParsedRow> {
    let line = row.line;
    let raw_date = cell(row, &mapping.date);
    let date = match parse_date(raw_date) {
        Ok(date) => date,
        Err(e) => {
            warn!(line, value = raw_date, "skipping row with unreadable date");
            issues.push(RowIssue {
                line,
                column: mapping.date.clone(),
                value: raw_date.to_string(),
                message: e.to_string(),
                action: IssueAction::Skipped,
            });
            return None;
        }
    };

    let raw_amount = cell(row, &mapping.amount);
    let (amount, problem) = coerce_amount(raw_amount);
    if let Some(message) = problem {
        warn!(line, value = raw_amount, "amount coerced to zero");
        issues.push(RowIssue {
            line,
            column: mapping.amount.clone(),
            value: raw_amount.to_string(),
            message,
            action: IssueAction::CoercedToZero,
        });
    }

    Some(ParsedRow { date, amount })
}

/// Builds reconciliation movements from rows
pub struct MovementImporter {
    mapping: ColumnMapping,
}

impl MovementImporter {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    /// Convert rows, keeping their order
    pub fn import_rows(&self, rows: &[Row]) -> ImportReport<Movement> {
        let mut report = ImportReport::default();

        for row in rows {
            let Some(parsed) = parse_row(&self.mapping, row, &mut report.issues) else {
                continue;
            };
            let description =
                optional_cell(row, self.mapping.description.as_ref()).unwrap_or_default();
            report
                .records
                .push(Movement::new(parsed.date, parsed.amount, description));
        }

        info!(
            movements = report.records.len(),
            issues = report.issues.len(),
            "movements imported"
        );
        report
    }

    /// Validate the mapping against the sheet, then convert every row
    pub fn import<S: SpreadsheetReader>(
        &self,
        sheet: &mut S,
    ) -> Result<ImportReport<Movement>, ImportError> {
        self.mapping.validate(sheet.headers())?;
        let rows = sheet.rows()?;
        Ok(self.import_rows(&rows))
    }
}

/// Builds payment records for the threshold audit
pub struct PaymentImporter {
    mapping: ColumnMapping,
}

impl PaymentImporter {
    pub fn new(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    pub fn import_rows(&self, rows: &[Row]) -> ImportReport<PaymentRecord> {
        let mut report = ImportReport::default();

        for row in rows {
            let Some(parsed) = parse_row(&self.mapping, row, &mut report.issues) else {
                continue;
            };
            report.records.push(PaymentRecord {
                third_party: optional_cell(row, self.mapping.third_party.as_ref())
                    .unwrap_or_default(),
                amount: parsed.amount,
                payment_method: optional_cell(row, self.mapping.payment_method.as_ref()),
                description: optional_cell(row, self.mapping.description.as_ref())
                    .unwrap_or_default(),
            });
        }

        info!(
            payments = report.records.len(),
            issues = report.issues.len(),
            "payments imported"
        );
        report
    }

    pub fn import<S: SpreadsheetReader>(
        &self,
        sheet: &mut S,
    ) -> Result<ImportReport<PaymentRecord>, ImportError> {
        self.mapping.validate(sheet.headers())?;
        let rows = sheet.rows()?;
        Ok(self.import_rows(&rows))
    }
}

/// Import errors
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid column mapping: {0}")]
    InvalidMapping(String),
}
