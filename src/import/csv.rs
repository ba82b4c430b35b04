//! CSV-backed spreadsheet reader

use std::io::Read;

use crate::import::ImportError;
use crate::traits::{Row, SpreadsheetReader};

/// Reads a CSV file with a header row into [`Row`]s
pub struct CsvSheetReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
}

impl<R: Read> CsvSheetReader<R> {
    /// Build a reader; `delimiter` is usually `b','` or `b';'`
    pub fn new(source: R, delimiter: u8) -> Result<Self, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        Ok(Self { reader, headers })
    }
}

impl<'a> CsvSheetReader<&'a [u8]> {
    /// Comma-delimited reader over an in-memory upload
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, ImportError> {
        Self::new(bytes, b',')
    }
}

impl<R: Read> SpreadsheetReader for CsvSheetReader<R> {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn rows(&mut self) -> Result<Vec<Row>, ImportError> {
        let mut rows = Vec::new();

        for (idx, result) in self.reader.records().enumerate() {
            let record = result?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }

            // the csv reader skips empty lines, so the index alone can drift
            let line = record
                .position()
                .map_or(idx + 2, |pos| pos.line() as usize);
            let cells = self
                .headers
                .iter()
                .zip(record.iter())
                .map(|(h, cell)| (h.clone(), cell.to_string()))
                .collect();
            rows.push(Row::new(line, cells));
        }

        Ok(rows)
    }
}
