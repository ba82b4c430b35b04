//! Purchase-invoice batches
//!
//! A batch of up to ten invoices is turned into one expense table. UBL XML
//! files are read directly; images are sent to the text generator with an
//! extraction prompt. An invoice that cannot be read becomes an error row
//! with a zero total and the rest of the batch carries on.

pub mod extraction;
pub mod ubl;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use extraction::*;
pub use ubl::extract_ubl_invoice;

/// Supplier label used on rows that could not be read
pub const READ_ERROR_SUPPLIER: &str = "ERROR DE LECTURA";

/// One row of the expense table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// File the data came from; first column of every export
    pub source_file: String,
    pub invoice_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub nit: Option<String>,
    pub total: Option<BigDecimal>,
    pub iva: Option<BigDecimal>,
    /// Set on rows that could not be read
    pub error_note: Option<String>,
}

impl InvoiceRecord {
    /// Row standing in for an unreadable invoice
    pub fn read_error(source_file: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            invoice_id: None,
            date: None,
            supplier: Some(READ_ERROR_SUPPLIER.to_string()),
            nit: None,
            total: Some(BigDecimal::from(0)),
            iva: None,
            error_note: Some(note.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_note.is_some()
    }
}

/// Result of processing a batch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceBatch {
    pub invoices: Vec<InvoiceRecord>,
}

impl InvoiceBatch {
    pub fn error_count(&self) -> usize {
        self.invoices.iter().filter(|i| i.is_error()).count()
    }

    /// Sum of invoice totals, missing totals count as zero
    pub fn total(&self) -> BigDecimal {
        self.invoices.iter().filter_map(|i| i.total.as_ref()).sum()
    }

    /// Recoverable IVA across the batch
    pub fn total_iva(&self) -> BigDecimal {
        self.invoices.iter().filter_map(|i| i.iva.as_ref()).sum()
    }
}

/// A file uploaded for extraction
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InvoiceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// UBL documents are handled locally instead of by the generator
    pub fn is_xml(&self) -> bool {
        self.name.to_lowercase().ends_with(".xml")
    }
}

/// Invoice-related errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvoiceError {
    #[error("batch has {given} invoices, the limit is {limit}")]
    BatchTooLarge { given: usize, limit: usize },
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid value {value:?} for {field}")]
    InvalidField { field: &'static str, value: String },
    #[error("unreadable extraction response: {0}")]
    Response(String),
    #[error("text generation failed: {0}")]
    Generation(#[from] crate::traits::GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total: Option<i64>, iva: Option<i64>) -> InvoiceRecord {
        InvoiceRecord {
            source_file: "f.jpg".to_string(),
            invoice_id: None,
            date: None,
            supplier: Some("Proveedor".to_string()),
            nit: None,
            total: total.map(BigDecimal::from),
            iva: iva.map(BigDecimal::from),
            error_note: None,
        }
    }

    #[test]
    fn test_batch_totals() {
        let batch = InvoiceBatch {
            invoices: vec![
                record(Some(119_000), Some(19_000)),
                record(Some(50_000), None),
                InvoiceRecord::read_error("bad.jpg", "timeout"),
            ],
        };

        assert_eq!(batch.total(), BigDecimal::from(169_000));
        assert_eq!(batch.total_iva(), BigDecimal::from(19_000));
        assert_eq!(batch.error_count(), 1);
    }

    #[test]
    fn test_empty_batch_totals_are_zero() {
        let batch = InvoiceBatch::default();
        assert_eq!(batch.total(), BigDecimal::from(0));
        assert_eq!(batch.total_iva(), BigDecimal::from(0));
    }

    #[test]
    fn test_read_error_row() {
        let row = InvoiceRecord::read_error("scan.png", "bad json");
        assert_eq!(row.supplier.as_deref(), Some(READ_ERROR_SUPPLIER));
        assert_eq!(row.total, Some(BigDecimal::from(0)));
        assert!(row.is_error());
    }

    #[test]
    fn test_xml_detection() {
        assert!(InvoiceFile::new("FE-01.XML", Vec::new()).is_xml());
        assert!(!InvoiceFile::new("scan.jpg", Vec::new()).is_xml());
    }
}
