//! Invoice extraction through the text generator

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::TaxConfig;
use crate::invoice::{extract_ubl_invoice, InvoiceBatch, InvoiceError, InvoiceFile, InvoiceRecord};
use crate::traits::{GenerationRequest, TextGenerator};
use crate::utils::{parse_amount, parse_date};

/// Prompt sent with every invoice image
pub const EXTRACTION_PROMPT: &str = r#"Analiza esta factura y extrae datos en JSON puro:
{"fecha": "YYYY-MM-DD", "proveedor": "texto", "nit": "texto", "total": numero, "iva": numero}
Si falta un dato usa null."#;

/// Shape the model is asked to reply with
#[derive(Debug, Deserialize)]
struct ExtractionReply {
    fecha: Option<String>,
    proveedor: Option<String>,
    nit: Option<Value>,
    total: Option<Value>,
    iva: Option<Value>,
}

/// Drop Markdown code fences and anything around the JSON object
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn value_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_amount(field: &'static str, value: Option<Value>) -> Result<Option<BigDecimal>, InvoiceError> {
    value_text(value)
        .map(|raw| {
            parse_amount(&raw).map_err(|_| InvoiceError::InvalidField { field, value: raw })
        })
        .transpose()
}

/// Parse the generator's reply into an invoice row
pub fn parse_extraction_response(
    source_file: impl Into<String>,
    text: &str,
) -> Result<InvoiceRecord, InvoiceError> {
    let reply: ExtractionReply = serde_json::from_str(strip_fences(text))
        .map_err(|e| InvoiceError::Response(e.to_string()))?;

    let date = reply
        .fecha
        .as_deref()
        .and_then(|raw| parse_date(raw).ok());

    Ok(InvoiceRecord {
        source_file: source_file.into(),
        invoice_id: None,
        date,
        supplier: reply.proveedor.filter(|s| !s.trim().is_empty()),
        nit: value_text(reply.nit),
        total: value_amount("total", reply.total)?,
        iva: value_amount("iva", reply.iva)?,
        error_note: None,
    })
}

/// Runs a batch of invoice files through UBL parsing or the generator
pub struct InvoiceExtractor<G: TextGenerator> {
    generator: G,
    max_batch: usize,
}

impl<G: TextGenerator> InvoiceExtractor<G> {
    pub fn new(generator: G) -> Self {
        Self::from_config(generator, &TaxConfig::default())
    }

    pub fn from_config(generator: G, config: &TaxConfig) -> Self {
        Self {
            generator,
            max_batch: config.max_invoices_per_batch,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Extract a single file
    pub async fn extract(&self, file: &InvoiceFile) -> Result<InvoiceRecord, InvoiceError> {
        if file.is_xml() {
            let xml = String::from_utf8_lossy(&file.bytes);
            return extract_ubl_invoice(file.name.clone(), &xml);
        }

        let request = GenerationRequest::new(EXTRACTION_PROMPT)
            .with_attachment(file.name.clone(), file.bytes.clone());
        let reply = self.generator.generate(&request).await?;
        parse_extraction_response(file.name.clone(), &reply)
    }

    /// Process every file in order. Only an oversized batch fails as a
    /// whole; per-file failures become error rows.
    pub async fn process_batch(&self, files: &[InvoiceFile]) -> Result<InvoiceBatch, InvoiceError> {
        if files.len() > self.max_batch {
            return Err(InvoiceError::BatchTooLarge {
                given: files.len(),
                limit: self.max_batch,
            });
        }

        let mut batch = InvoiceBatch::default();
        for (idx, file) in files.iter().enumerate() {
            info!(file = %file.name, position = idx + 1, of = files.len(), "extracting invoice");

            let record = match self.extract(file).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(file = %file.name, error = %e, "invoice could not be read");
                    InvoiceRecord::read_error(file.name.clone(), e.to_string())
                }
            };
            batch.invoices.push(record);
        }

        info!(
            invoices = batch.invoices.len(),
            errors = batch.error_count(),
            "invoice batch finished"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_fenced_response() {
        let text = "```json\n{\"fecha\": \"2024-02-10\", \"proveedor\": \"Exito\", \"nit\": \"890900608\", \"total\": 119000, \"iva\": 19000}\n```";
        let invoice = parse_extraction_response("a.jpg", text).unwrap();

        assert_eq!(invoice.date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(invoice.supplier.as_deref(), Some("Exito"));
        assert_eq!(invoice.nit.as_deref(), Some("890900608"));
        assert_eq!(invoice.total, Some(BigDecimal::from(119_000)));
        assert_eq!(invoice.iva, Some(BigDecimal::from(19_000)));
    }

    #[test]
    fn test_parse_nulls_and_string_amounts() {
        let text = r#"{"fecha": null, "proveedor": "Tienda", "nit": null, "total": "$ 45,500", "iva": null}"#;
        let invoice = parse_extraction_response("b.jpg", text).unwrap();

        assert_eq!(invoice.date, None);
        assert_eq!(invoice.nit, None);
        assert_eq!(invoice.total, Some(BigDecimal::from(45_500)));
        assert_eq!(invoice.iva, None);
    }

    #[test]
    fn test_numeric_nit_is_kept_as_text() {
        let text = r#"{"fecha": "2024-01-01", "proveedor": "X", "nit": 900123456, "total": 1, "iva": 0}"#;
        let invoice = parse_extraction_response("c.jpg", text).unwrap();
        assert_eq!(invoice.nit.as_deref(), Some("900123456"));
    }

    #[test]
    fn test_non_json_response() {
        assert!(matches!(
            parse_extraction_response("d.jpg", "I could not read the invoice"),
            Err(InvoiceError::Response(_))
        ));
    }

    #[test]
    fn test_garbage_amount() {
        let text = r#"{"total": "mucho"}"#;
        assert!(matches!(
            parse_extraction_response("e.jpg", text),
            Err(InvoiceError::InvalidField { field: "total", .. })
        ));
    }
}
