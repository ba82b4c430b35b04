//! Per-session state owned by the surrounding application
//!
//! The dashboard keeps a running history of payments made to third parties
//! while a user works. It lives in an explicit [`SessionState`] value that
//! the application creates, passes to whoever needs it and drops when the
//! session ends.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::tax::nit::normalize_nit;
use crate::tax::PaymentRecord;
use crate::types::*;

/// A payment recorded during the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirdPartyPayment {
    pub id: Uuid,
    /// Normalized NIT (digits only, no check digit)
    pub nit: String,
    pub date: NaiveDate,
    pub amount: BigDecimal,
    pub concept: String,
}

/// Third-party payment history for one user session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    payments: Vec<ThirdPartyPayment>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a payment; the NIT may carry separators and a trailing `-DV`
    pub fn record_payment(
        &mut self,
        nit: &str,
        date: NaiveDate,
        amount: BigDecimal,
        concept: impl Into<String>,
    ) -> CoreResult<&ThirdPartyPayment> {
        let base = nit.rsplit_once('-').map_or(nit, |(base, _)| base);
        let nit = normalize_nit(base)?;

        self.payments.push(ThirdPartyPayment {
            id: Uuid::new_v4(),
            nit,
            date,
            amount,
            concept: concept.into(),
        });

        self.payments
            .last()
            .ok_or_else(|| CoreError::Validation("payment was not recorded".to_string()))
    }

    /// Record an audited payment under the third party's NIT. The record's
    /// own `third_party` may be a name, so the NIT is passed separately.
    pub fn record_payment_record(
        &mut self,
        nit: &str,
        payment: &PaymentRecord,
        date: NaiveDate,
    ) -> CoreResult<&ThirdPartyPayment> {
        self.record_payment(
            nit,
            date,
            payment.amount.clone(),
            payment.description.clone(),
        )
    }

    pub fn payments(&self) -> &[ThirdPartyPayment] {
        &self.payments
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    /// Payments made to one third party, oldest first by recording order
    pub fn history_for(&self, nit: &str) -> Vec<&ThirdPartyPayment> {
        let Ok(nit) = normalize_nit(nit.rsplit_once('-').map_or(nit, |(base, _)| base)) else {
            return Vec::new();
        };
        self.payments.iter().filter(|p| p.nit == nit).collect()
    }

    /// Accumulated amount per third party, ordered by NIT
    pub fn totals_by_third_party(&self) -> BTreeMap<String, BigDecimal> {
        let mut totals: BTreeMap<String, BigDecimal> = BTreeMap::new();
        for payment in &self.payments {
            *totals
                .entry(payment.nit.clone())
                .or_insert_with(|| BigDecimal::from(0)) += &payment.amount;
        }
        totals
    }

    /// Third parties whose accumulated payments reach `threshold`
    pub fn third_parties_above(&self, threshold: &BigDecimal) -> Vec<(String, BigDecimal)> {
        self.totals_by_third_party()
            .into_iter()
            .filter(|(_, total)| total >= threshold)
            .collect()
    }

    /// Forget everything, e.g. on logout
    pub fn clear(&mut self) {
        self.payments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn test_record_and_query_history() {
        let mut session = SessionState::new();
        session
            .record_payment("900.123.456-8", day(1), BigDecimal::from(100_000), "Honorarios")
            .unwrap();
        session
            .record_payment("900123456", day(2), BigDecimal::from(50_000), "Honorarios")
            .unwrap();
        session
            .record_payment("800197268", day(3), BigDecimal::from(10_000), "Papeleria")
            .unwrap();

        let history = session.history_for("900123456-8");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, day(1));
        assert_ne!(history[0].id, history[1].id);
    }

    #[test]
    fn test_totals_and_threshold() {
        let mut session = SessionState::new();
        session
            .record_payment("900123456", day(1), BigDecimal::from(60), "a")
            .unwrap();
        session
            .record_payment("900123456", day(2), BigDecimal::from(40), "b")
            .unwrap();
        session
            .record_payment("800197268", day(2), BigDecimal::from(99), "c")
            .unwrap();

        let totals = session.totals_by_third_party();
        assert_eq!(totals["900123456"], BigDecimal::from(100));
        assert_eq!(totals["800197268"], BigDecimal::from(99));

        let above = session.third_parties_above(&BigDecimal::from(100));
        assert_eq!(above, vec![("900123456".to_string(), BigDecimal::from(100))]);
    }

    #[test]
    fn test_invalid_nit_rejected() {
        let mut session = SessionState::new();
        assert!(session
            .record_payment("ABC", day(1), BigDecimal::from(1), "x")
            .is_err());
        assert!(session.is_empty());
    }

    #[test]
    fn test_record_named_supplier_payment() {
        let mut payment = PaymentRecord::new("Ferreteria Ruiz", BigDecimal::from(250_000), None);
        payment.description = "Materiales".to_string();

        let mut session = SessionState::new();
        let recorded = session
            .record_payment_record("900.123.456-8", &payment, day(5))
            .unwrap();
        assert_eq!(recorded.nit, "900123456");
        assert_eq!(recorded.concept, "Materiales");
        assert_eq!(session.history_for("900123456").len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut session = SessionState::new();
        session
            .record_payment("900123456", day(1), BigDecimal::from(1), "x")
            .unwrap();
        session.clear();
        assert!(session.is_empty());
        assert!(session.totals_by_third_party().is_empty());
    }
}
