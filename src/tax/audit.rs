//! Threshold audits over payments and payroll records
//!
//! Each check looks at a single record and raises at most one finding.
//! A record's overall severity is the highest among its findings.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TaxConfig;
use crate::types::*;

/// A payment as read from the expenses spreadsheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Third party (supplier) name or NIT, for reporting
    pub third_party: String,
    pub amount: BigDecimal,
    /// Free-text method of payment ("Cash", "Transferencia", ...)
    pub payment_method: Option<String>,
    pub description: String,
}

impl PaymentRecord {
    pub fn new(
        third_party: impl Into<String>,
        amount: BigDecimal,
        payment_method: Option<String>,
    ) -> Self {
        Self {
            third_party: third_party.into(),
            amount,
            payment_method,
            description: String::new(),
        }
    }
}

/// An employee's monthly compensation split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub employee: String,
    pub base_salary: BigDecimal,
    /// Bonuses and allowances not classified as salary
    pub non_salary_payments: BigDecimal,
}

/// Findings raised for one record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditOutcome {
    pub findings: Vec<Finding>,
}

impl AuditOutcome {
    /// Highest severity among the findings, `None` when the record is clean
    pub fn severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }

    /// `"OK"` or the label of the highest severity
    pub fn status(&self) -> String {
        self.severity()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "OK".to_string())
    }

    fn push(&mut self, finding: Option<Finding>) {
        self.findings.extend(finding);
    }
}

/// Stateless threshold checks driven by a [`TaxConfig`]
#[derive(Debug, Clone)]
pub struct ThresholdAuditor {
    config: TaxConfig,
}

impl Default for ThresholdAuditor {
    fn default() -> Self {
        Self::new(TaxConfig::default())
    }
}

impl ThresholdAuditor {
    pub fn new(config: TaxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaxConfig {
        &self.config
    }

    /// Cash payments above the ceiling are HIGH; exactly the ceiling is fine
    pub fn check_cash_ceiling(
        &self,
        amount: &BigDecimal,
        payment_method: Option<&str>,
    ) -> Option<Finding> {
        let method = payment_method?.to_lowercase();
        let is_cash = self
            .config
            .cash_keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .any(|k| method.contains(&k.to_lowercase()));

        if !is_cash || *amount <= self.config.cash_ceiling {
            return None;
        }

        Some(Finding {
            message: format!(
                "Cash payment of {} exceeds the cash ceiling of {}; not deductible",
                amount, self.config.cash_ceiling
            ),
            severity: Severity::High,
            kind: FindingKind::CashCeiling {
                amount: amount.clone(),
                ceiling: self.config.cash_ceiling.clone(),
            },
        })
    }

    /// Amounts at or above a withholding base are MEDIUM; the purchase band
    /// wins when both bases are crossed
    pub fn check_withholding_base(&self, amount: &BigDecimal) -> Option<Finding> {
        let (band, threshold) = if *amount >= self.config.withholding_purchase_base {
            (
                WithholdingBand::Purchases,
                &self.config.withholding_purchase_base,
            )
        } else if *amount >= self.config.withholding_service_base {
            (
                WithholdingBand::Services,
                &self.config.withholding_service_base,
            )
        } else {
            return None;
        };

        Some(Finding {
            message: format!(
                "Amount {} reaches the {} withholding base of {}; apply withholding",
                amount, band, threshold
            ),
            severity: Severity::Medium,
            kind: FindingKind::WithholdingBase {
                amount: amount.clone(),
                band,
                threshold: threshold.clone(),
            },
        })
    }

    /// Non-salary payments above 40 % of total compensation are HIGH; the
    /// excess has to be added back to the contribution base
    pub fn check_non_salary_ratio(
        &self,
        base_salary: &BigDecimal,
        non_salary_payments: &BigDecimal,
    ) -> Option<Finding> {
        let total = base_salary + non_salary_payments;
        let limit = &total * &self.config.non_salary_cap;

        if *non_salary_payments <= limit {
            return None;
        }

        let excess = non_salary_payments - &limit;
        let adjusted_base = base_salary + &excess;

        Some(Finding {
            message: format!(
                "Non-salary payments of {} exceed the limit of {} by {}; contribution base becomes {}",
                non_salary_payments, limit, excess, adjusted_base
            ),
            severity: Severity::High,
            kind: FindingKind::NonSalaryRatio {
                limit,
                excess,
                adjusted_base,
            },
        })
    }

    /// Run the cash and withholding checks over one payment
    pub fn audit_payment(&self, payment: &PaymentRecord) -> AuditOutcome {
        let mut outcome = AuditOutcome::default();
        outcome.push(self.check_cash_ceiling(&payment.amount, payment.payment_method.as_deref()));
        outcome.push(self.check_withholding_base(&payment.amount));

        debug!(
            third_party = %payment.third_party,
            amount = %payment.amount,
            status = %outcome.status(),
            "payment audited"
        );
        outcome
    }

    /// Audit a batch of payments, one outcome per payment in input order
    pub fn audit_payments(&self, payments: &[PaymentRecord]) -> Vec<AuditOutcome> {
        payments.iter().map(|p| self.audit_payment(p)).collect()
    }

    /// Run the non-salary check over one payroll record
    pub fn audit_payroll(&self, record: &PayrollRecord) -> AuditOutcome {
        let mut outcome = AuditOutcome::default();
        outcome.push(self.check_non_salary_ratio(&record.base_salary, &record.non_salary_payments));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auditor() -> ThresholdAuditor {
        ThresholdAuditor::default()
    }

    #[test]
    fn test_cash_ceiling_boundary() {
        let auditor = auditor();
        let ceiling = auditor.config().cash_ceiling.clone();

        assert!(auditor.check_cash_ceiling(&ceiling, Some("Cash")).is_none());

        let above = &ceiling + BigDecimal::from(1);
        let finding = auditor.check_cash_ceiling(&above, Some("Cash")).unwrap();
        assert_eq!(finding.severity, Severity::High);
    }

    #[test]
    fn test_cash_keyword_is_case_insensitive_substring() {
        let auditor = auditor();
        let amount = BigDecimal::from(10_000_000);

        assert!(auditor.check_cash_ceiling(&amount, Some("PETTY CASH")).is_some());
        assert!(auditor.check_cash_ceiling(&amount, Some("Efectivo")).is_some());
        assert!(auditor.check_cash_ceiling(&amount, Some("Transferencia")).is_none());
        assert!(auditor.check_cash_ceiling(&amount, None).is_none());
    }

    #[test]
    fn test_withholding_bands() {
        let auditor = auditor();
        let service = auditor.config().withholding_service_base.clone();
        let purchase = auditor.config().withholding_purchase_base.clone();

        let below = &service - BigDecimal::from(1);
        assert!(auditor.check_withholding_base(&below).is_none());

        let finding = auditor.check_withholding_base(&service).unwrap();
        assert_eq!(finding.severity, Severity::Medium);
        assert!(matches!(
            finding.kind,
            FindingKind::WithholdingBase {
                band: WithholdingBand::Services,
                ..
            }
        ));

        let finding = auditor.check_withholding_base(&purchase).unwrap();
        assert!(matches!(
            finding.kind,
            FindingKind::WithholdingBase {
                band: WithholdingBand::Purchases,
                ..
            }
        ));
    }

    #[test]
    fn test_non_salary_over_limit() {
        let finding = auditor()
            .check_non_salary_ratio(&BigDecimal::from(1_000_000), &BigDecimal::from(700_000))
            .unwrap();

        assert_eq!(finding.severity, Severity::High);
        match finding.kind {
            FindingKind::NonSalaryRatio {
                limit,
                excess,
                adjusted_base,
            } => {
                assert_eq!(limit, BigDecimal::from(680_000));
                assert_eq!(excess, BigDecimal::from(20_000));
                assert_eq!(adjusted_base, BigDecimal::from(1_020_000));
            }
            other => panic!("unexpected finding {other:?}"),
        }
    }

    #[test]
    fn test_non_salary_under_limit() {
        assert!(auditor()
            .check_non_salary_ratio(&BigDecimal::from(1_000_000), &BigDecimal::from(600_000))
            .is_none());
    }

    #[test]
    fn test_payment_outcome_takes_highest_severity() {
        let payment = PaymentRecord::new(
            "Ferreteria La 14",
            BigDecimal::from(6_000_000),
            Some("cash".to_string()),
        );
        let outcome = auditor().audit_payment(&payment);

        assert_eq!(outcome.findings.len(), 2);
        assert_eq!(outcome.severity(), Some(Severity::High));
        assert_eq!(outcome.status(), "HIGH");
    }

    #[test]
    fn test_clean_payment_is_ok() {
        let payment = PaymentRecord::new("Papeleria", BigDecimal::from(50_000), None);
        let outcome = auditor().audit_payment(&payment);
        assert!(outcome.is_ok());
        assert_eq!(outcome.severity(), None);
        assert_eq!(outcome.status(), "OK");
    }

    #[test]
    fn test_audit_payments_preserves_order() {
        let payments = vec![
            PaymentRecord::new("a", BigDecimal::from(10), None),
            PaymentRecord::new("b", BigDecimal::from(300_000), None),
        ];
        let outcomes = auditor().audit_payments(&payments);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1].severity(), Some(Severity::Medium));
    }

    #[test]
    fn test_audit_payroll() {
        let record = PayrollRecord {
            employee: "Ana".to_string(),
            base_salary: BigDecimal::from(1_000_000),
            non_salary_payments: BigDecimal::from(700_000),
        };
        assert_eq!(auditor().audit_payroll(&record).status(), "HIGH");
    }
}
