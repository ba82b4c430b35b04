//! Field extraction from DIAN UBL 2.1 electronic invoices
//!
//! Only the handful of fields the batch report needs are read; this is a
//! pattern scan over the document, not a full XML parser.

use bigdecimal::BigDecimal;
use regex::Regex;
use std::sync::OnceLock;

use crate::invoice::{InvoiceError, InvoiceRecord};
use crate::utils::{parse_amount, parse_date};

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_invoice_id, r"<cbc:ID(?:\s[^>]*)?>\s*([^<]+?)\s*</cbc:ID>");
re!(re_issue_date, r"<cbc:IssueDate>\s*([^<]+?)\s*</cbc:IssueDate>");
re!(re_supplier,
    r"(?s)<cac:AccountingSupplierParty>(.*?)</cac:AccountingSupplierParty>");
re!(re_registration_name,
    r"<cbc:RegistrationName>\s*([^<]+?)\s*</cbc:RegistrationName>");
re!(re_company_id, r"<cbc:CompanyID([^>]*)>\s*([^<]+?)\s*</cbc:CompanyID>");
re!(re_scheme_id, r#"schemeID="(\d)""#);
re!(re_payable,
    r"(?s)<cac:LegalMonetaryTotal>.*?<cbc:PayableAmount[^>]*>\s*([^<]+?)\s*</cbc:PayableAmount>");
re!(re_tax_total, r"(?s)<cac:TaxTotal>(.*?)</cac:TaxTotal>");
re!(re_tax_amount, r"<cbc:TaxAmount[^>]*>\s*([^<]+?)\s*</cbc:TaxAmount>");
re!(re_tax_scheme_id,
    r"(?s)<cac:TaxScheme>\s*<cbc:ID[^>]*>\s*([^<]+?)\s*</cbc:ID>");
re!(re_line_start, r"<cac:(?:InvoiceLine|CreditNoteLine|DebitNoteLine)[\s>]");

/// DIAN tax scheme code for IVA
pub const IVA_SCHEME: &str = "01";

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn amount(field: &'static str, raw: &str) -> Result<BigDecimal, InvoiceError> {
    parse_amount(raw).map_err(|_| InvoiceError::InvalidField {
        field,
        value: raw.to_string(),
    })
}

/// Supplier NIT as `"NIT-DV"` when the DV travels in `schemeID`
fn supplier_nit(supplier: &str) -> Option<String> {
    let caps = re_company_id().captures(supplier)?;
    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let nit = caps.get(2)?.as_str();

    Some(match capture(re_scheme_id(), attrs) {
        Some(dv) => format!("{nit}-{dv}"),
        None => nit.to_string(),
    })
}

/// Everything before the first line item. Lines repeat `TaxTotal` for
/// their own share of the tax.
fn document_level(xml: &str) -> &str {
    re_line_start().find(xml).map_or(xml, |m| &xml[..m.start()])
}

fn is_iva_block(body: &str) -> bool {
    re_tax_scheme_id()
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .any(|id| id.as_str() == IVA_SCHEME)
}

/// Sum of the document-level IVA tax totals, `None` when the invoice carries
/// no IVA block
fn iva_total(xml: &str) -> Result<Option<BigDecimal>, InvoiceError> {
    let mut total: Option<BigDecimal> = None;

    for block in re_tax_total().captures_iter(document_level(xml)) {
        let body = block.get(1).map_or("", |m| m.as_str());
        if !is_iva_block(body) {
            continue;
        }
        if let Some(raw) = capture(re_tax_amount(), body) {
            let value = amount("TaxAmount", raw)?;
            total = Some(total.unwrap_or_else(|| BigDecimal::from(0)) + value);
        }
    }

    Ok(total)
}

/// Read invoice number, issue date, supplier, payable amount and IVA from a
/// UBL invoice. ID, IssueDate and PayableAmount are mandatory.
pub fn extract_ubl_invoice(
    source_file: impl Into<String>,
    xml: &str,
) -> Result<InvoiceRecord, InvoiceError> {
    let invoice_id = capture(re_invoice_id(), xml).ok_or(InvoiceError::MissingField("ID"))?;

    let raw_date =
        capture(re_issue_date(), xml).ok_or(InvoiceError::MissingField("IssueDate"))?;
    let date = parse_date(raw_date).map_err(|_| InvoiceError::InvalidField {
        field: "IssueDate",
        value: raw_date.to_string(),
    })?;

    let raw_total =
        capture(re_payable(), xml).ok_or(InvoiceError::MissingField("PayableAmount"))?;
    let total = amount("PayableAmount", raw_total)?;

    let supplier_block = capture(re_supplier(), xml);
    let supplier = supplier_block
        .and_then(|s| capture(re_registration_name(), s))
        .map(unescape);
    let nit = supplier_block.and_then(supplier_nit);

    Ok(InvoiceRecord {
        source_file: source_file.into(),
        invoice_id: Some(unescape(invoice_id)),
        date: Some(date),
        supplier,
        nit,
        total: Some(total),
        iva: iva_total(xml)?,
        error_note: None,
    })
}
