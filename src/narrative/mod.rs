//! Narrative commentary over computed results
//!
//! Prompts are assembled from summaries the core already computed; the
//! generator only adds prose. A failed call never propagates: the caller
//! gets a readable error string in place of the commentary.

use std::fmt::Write as _;
use tracing::{debug, warn};

use crate::invoice::InvoiceBatch;
use crate::payroll::PayrollCost;
use crate::reconciliation::MatchResult;
use crate::tax::{AuditOutcome, PaymentRecord};
use crate::traits::{GenerationRequest, TextGenerator};

/// Prefix of every commentary that could not be generated
pub const COMMENTARY_ERROR_PREFIX: &str = "Error generating commentary: ";

/// Shared instructions prepended to every prompt
const ROLE: &str = "Actúa como un contador público colombiano. \
Redacta un análisis breve y profesional en español para el cliente.";

/// Prompt for a reconciliation run
pub fn reconciliation_prompt(result: &MatchResult) -> String {
    let s = result.summary();
    let mut prompt = format!(
        "{ROLE}\n\nConciliación bancaria:\n\
         - Partidas conciliadas: {} por {}\n\
         - Partidas solo en extracto: {} por {}\n\
         - Partidas solo en libros: {} por {}\n\
         - Diferencia neta: {}\n",
        s.matched_count,
        s.matched_total,
        s.unmatched_bank_count,
        s.unmatched_bank_total,
        s.unmatched_ledger_count,
        s.unmatched_ledger_total,
        s.net_difference,
    );

    for m in result.unmatched_bank.iter().take(10) {
        let _ = writeln!(prompt, "  * Extracto {} {} {}", m.date, m.amount, m.description);
    }
    for m in result.unmatched_ledger.iter().take(10) {
        let _ = writeln!(prompt, "  * Libros {} {} {}", m.date, m.amount, m.description);
    }

    prompt.push_str("\nExplica las posibles causas de las diferencias y los ajustes sugeridos.");
    prompt
}

/// Prompt for a payment audit
pub fn audit_prompt(payments: &[PaymentRecord], outcomes: &[AuditOutcome]) -> String {
    let flagged: Vec<(&PaymentRecord, &AuditOutcome)> = payments
        .iter()
        .zip(outcomes)
        .filter(|(_, o)| !o.is_ok())
        .collect();

    let mut prompt = format!(
        "{ROLE}\n\nAuditoría de pagos: {} revisados, {} con hallazgos.\n",
        payments.len(),
        flagged.len()
    );
    for (payment, outcome) in flagged {
        for finding in &outcome.findings {
            let _ = writeln!(
                prompt,
                "- [{}] {} ({}): {}",
                finding.severity, payment.third_party, payment.amount, finding.message
            );
        }
    }

    prompt.push_str("\nResume los riesgos tributarios y las acciones recomendadas.");
    prompt
}

/// Prompt for an employer payroll cost breakdown
pub fn payroll_prompt(cost: &PayrollCost) -> String {
    format!(
        "{ROLE}\n\nCosto de nómina para el empleador:\n\
         - Salario base: {}\n\
         - Auxilio de transporte: {}\n\
         - Aportes (salud, pensión, ARL, parafiscales): {}\n\
         - Prestaciones sociales: {}\n\
         - Costo total: {}\n\n\
         Explica al cliente qué compone el costo total.",
        cost.base_salary,
        cost.transport_allowance,
        cost.total_contributions(),
        cost.social_benefits,
        cost.total_employer_cost,
    )
}

/// Prompt for an invoice batch
pub fn invoice_batch_prompt(batch: &InvoiceBatch) -> String {
    format!(
        "{ROLE}\n\nLote de facturas de compra: {} facturas, {} con errores de lectura.\n\
         Total del lote: {}\nIVA descontable: {}\n\n\
         Comenta el impacto en el IVA a pagar del período.",
        batch.invoices.len(),
        batch.error_count(),
        batch.total(),
        batch.total_iva(),
    )
}

/// Asks a [`TextGenerator`] for commentary and turns failures into text
pub struct NarrativeService<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> NarrativeService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Send a prompt; on failure return an error message instead
    pub async fn comment(&self, prompt: String) -> String {
        debug!(prompt_len = prompt.len(), "requesting commentary");
        match self.generator.generate(&GenerationRequest::new(prompt)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "commentary generation failed");
                format!("{COMMENTARY_ERROR_PREFIX}{e}")
            }
        }
    }

    pub async fn comment_reconciliation(&self, result: &MatchResult) -> String {
        self.comment(reconciliation_prompt(result)).await
    }

    pub async fn comment_audit(
        &self,
        payments: &[PaymentRecord],
        outcomes: &[AuditOutcome],
    ) -> String {
        self.comment(audit_prompt(payments, outcomes)).await
    }

    pub async fn comment_payroll(&self, cost: &PayrollCost) -> String {
        self.comment(payroll_prompt(cost)).await
    }

    pub async fn comment_invoice_batch(&self, batch: &InvoiceBatch) -> String {
        self.comment(invoice_batch_prompt(batch)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::ReconciliationMatcher;
    use crate::tax::ThresholdAuditor;
    use crate::traits::GenerationError;
    use crate::types::Movement;
    use crate::utils::MockGenerator;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn result() -> MatchResult {
        let mv = |d: u32, a: i64, desc: &str| {
            Movement::new(
                NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                BigDecimal::from(a),
                desc,
            )
        };
        ReconciliationMatcher::default().reconcile(
            vec![mv(1, 100, "consignacion"), mv(5, 200, "nota debito")],
            vec![mv(3, 100, "recibo"), mv(20, 200, "cheque 0045")],
        )
    }

    #[test]
    fn test_reconciliation_prompt_contains_summary() {
        let prompt = reconciliation_prompt(&result());
        assert!(prompt.contains("Partidas conciliadas: 1 por 100"));
        assert!(prompt.contains("nota debito"));
        assert!(prompt.contains("cheque 0045"));
    }

    #[test]
    fn test_audit_prompt_lists_only_flagged() {
        let payments = vec![
            PaymentRecord::new("Limpio", BigDecimal::from(10), None),
            PaymentRecord::new("Grande", BigDecimal::from(6_000_000), Some("cash".into())),
        ];
        let outcomes = ThresholdAuditor::default().audit_payments(&payments);
        let prompt = audit_prompt(&payments, &outcomes);

        assert!(prompt.contains("2 revisados, 1 con hallazgos"));
        assert!(prompt.contains("[HIGH] Grande"));
        assert!(!prompt.contains("Limpio"));
    }

    #[tokio::test]
    async fn test_comment_returns_generated_text() {
        let service = NarrativeService::new(MockGenerator::new("  Todo cuadra.  "));
        let text = service.comment_reconciliation(&result()).await;
        assert_eq!(text, "Todo cuadra.");
        assert_eq!(service.generator().prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_string() {
        let service = NarrativeService::new(MockGenerator::failing(GenerationError::Service(
            "quota exceeded".to_string(),
        )));
        let text = service.comment_reconciliation(&result()).await;
        assert!(text.starts_with(COMMENTARY_ERROR_PREFIX));
        assert!(text.contains("quota exceeded"));
    }
}
