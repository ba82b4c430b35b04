//! Traits for the external collaborators the core talks to
//!
//! The core never does I/O itself. Spreadsheets come in through a
//! [`SpreadsheetReader`], and narrative commentary goes out through a
//! [`TextGenerator`]. Implement these against whatever file store or model
//! API the surrounding application uses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Index;

use crate::import::ImportError;

/// One spreadsheet row: column name to raw cell text, plus the sheet line
/// it was read from
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Line in the source sheet, counting the header as line 1
    pub line: usize,
    pub cells: HashMap<String, String>,
}

impl Row {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// Raw text of a cell, `None` when the column is absent
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

impl Index<&str> for Row {
    type Output = String;

    fn index(&self, column: &str) -> &String {
        &self.cells[column]
    }
}

/// Source of tabular rows, in sheet order
pub trait SpreadsheetReader {
    /// Column names as they appear in the header
    fn headers(&self) -> &[String];

    /// All non-blank data rows, preserving their original order and
    /// line numbers
    fn rows(&mut self) -> Result<Vec<Row>, ImportError>;
}

/// A prompt plus an optional binary attachment (e.g. an invoice image)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Name of the attachment, for logs and error rows
    pub attachment_name: Option<String>,
    #[serde(skip)]
    pub attachment: Option<Vec<u8>>,
}

impl GenerationRequest {
    /// Create a text-only request
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            attachment_name: None,
            attachment: None,
        }
    }

    /// Attach a named binary payload
    pub fn with_attachment(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachment_name = Some(name.into());
        self.attachment = Some(bytes);
        self
    }
}

/// Text-generation service (a hosted LLM or anything with the same shape)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a reply for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Failures reported by a text generator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no model available: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("service error: {0}")]
    Service(String),
}
