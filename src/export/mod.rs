//! Spreadsheet export of reconciliation results, audit findings and
//! invoice batches
//!
//! Every writer emits one CSV row per reported item so the output opens
//! directly in a spreadsheet.

use bigdecimal::BigDecimal;
use std::io::Write;

use crate::invoice::InvoiceBatch;
use crate::reconciliation::MatchResult;
use crate::tax::{AuditOutcome, PaymentRecord};
use crate::types::*;

/// Reconciliation status column values
pub const STATUS_MATCHED: &str = "MATCHED";
pub const STATUS_BANK_ONLY: &str = "UNMATCHED_BANK";
pub const STATUS_LEDGER_ONLY: &str = "UNMATCHED_LEDGER";

fn opt_date(m: Option<&Movement>) -> String {
    m.map(|m| m.date.to_string()).unwrap_or_default()
}

fn opt_amount(m: Option<&Movement>) -> String {
    m.map(|m| m.amount.to_string()).unwrap_or_default()
}

fn opt_description(m: Option<&Movement>) -> String {
    m.map(|m| m.description.clone()).unwrap_or_default()
}

fn movement_row(
    status: &str,
    bank: Option<&Movement>,
    ledger: Option<&Movement>,
    days_apart: Option<i64>,
) -> [String; 9] {
    [
        status.to_string(),
        opt_date(bank),
        opt_amount(bank),
        opt_description(bank),
        opt_date(ledger),
        opt_amount(ledger),
        opt_description(ledger),
        days_apart.map(|d| d.to_string()).unwrap_or_default(),
        String::new(),
    ]
}

/// Write one row per matched pair, then one per unmatched bank movement,
/// then one per unmatched ledger movement
pub fn write_match_result<W: Write>(result: &MatchResult, writer: W) -> CoreResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "status",
        "bank_date",
        "bank_amount",
        "bank_description",
        "ledger_date",
        "ledger_amount",
        "ledger_description",
        "days_apart",
        "note",
    ])?;

    for pair in &result.matched_pairs {
        wtr.write_record(movement_row(
            STATUS_MATCHED,
            Some(&pair.bank),
            Some(&pair.ledger),
            Some(pair.days_apart),
        ))?;
    }

    for movement in &result.unmatched_bank {
        let mut row = movement_row(STATUS_BANK_ONLY, Some(movement), None, None);
        row[8] = "Not found in ledger".to_string();
        wtr.write_record(row)?;
    }

    for movement in &result.unmatched_ledger {
        let mut row = movement_row(STATUS_LEDGER_ONLY, None, Some(movement), None);
        row[8] = "Not found in bank statement".to_string();
        wtr.write_record(row)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write one row per finding; clean payments get a single `OK` row
pub fn write_findings<W: Write>(
    payments: &[PaymentRecord],
    outcomes: &[AuditOutcome],
    writer: W,
) -> CoreResult<()> {
    if payments.len() != outcomes.len() {
        return Err(CoreError::Validation(format!(
            "{} payments but {} audit outcomes",
            payments.len(),
            outcomes.len()
        )));
    }

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "third_party",
        "amount",
        "payment_method",
        "status",
        "severity",
        "finding",
    ])?;

    for (payment, outcome) in payments.iter().zip(outcomes) {
        let base = [
            payment.third_party.clone(),
            payment.amount.to_string(),
            payment.payment_method.clone().unwrap_or_default(),
            outcome.status(),
        ];

        if outcome.findings.is_empty() {
            wtr.write_record(base.iter().map(String::as_str).chain(["", ""]))?;
            continue;
        }

        for finding in &outcome.findings {
            let severity = finding.severity.to_string();
            wtr.write_record(
                base.iter()
                    .map(String::as_str)
                    .chain([severity.as_str(), finding.message.as_str()]),
            )?;
        }
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write one row per invoice with the source file first, then a totals row
pub fn write_invoice_batch<W: Write>(batch: &InvoiceBatch, writer: W) -> CoreResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "source_file",
        "date",
        "supplier",
        "nit",
        "total",
        "iva",
        "error_note",
    ])?;

    for invoice in &batch.invoices {
        wtr.write_record([
            invoice.source_file.clone(),
            invoice.date.map(|d| d.to_string()).unwrap_or_default(),
            invoice.supplier.clone().unwrap_or_default(),
            invoice.nit.clone().unwrap_or_default(),
            amount_cell(invoice.total.as_ref()),
            amount_cell(invoice.iva.as_ref()),
            invoice.error_note.clone().unwrap_or_default(),
        ])?;
    }

    wtr.write_record([
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        String::new(),
        batch.total().to_string(),
        batch.total_iva().to_string(),
        String::new(),
    ])?;

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn amount_cell(amount: Option<&BigDecimal>) -> String {
    amount.map(|a| a.to_string()).unwrap_or_default()
}
