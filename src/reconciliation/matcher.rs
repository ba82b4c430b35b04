//! Bank-to-ledger matching

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::TaxConfig;
use crate::types::Movement;

/// Default date tolerance, in days, between a bank and a ledger movement
pub const DEFAULT_TOLERANCE_DAYS: i64 = 3;

/// How to choose among several qualifying ledger movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// First qualifying ledger movement by position
    #[default]
    FirstFit,
    /// Smallest date gap, ties broken by position
    ClosestDate,
}

/// A bank movement paired with the ledger movement that absorbed it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub bank: Movement,
    pub ledger: Movement,
    /// Absolute date distance between both sides
    pub days_apart: i64,
}

impl MatchedPair {
    /// The value both sides agreed on
    pub fn amount(&self) -> &BigDecimal {
        &self.bank.amount
    }
}

/// Partition of a reconciliation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched_pairs: Vec<MatchedPair>,
    pub unmatched_bank: Vec<Movement>,
    pub unmatched_ledger: Vec<Movement>,
}

/// Totals describing a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub matched_count: usize,
    pub unmatched_bank_count: usize,
    pub unmatched_ledger_count: usize,
    pub matched_total: BigDecimal,
    pub unmatched_bank_total: BigDecimal,
    pub unmatched_ledger_total: BigDecimal,
    /// Unmatched bank total minus unmatched ledger total
    pub net_difference: BigDecimal,
}

impl MatchResult {
    /// Number of movements across all three collections
    pub fn movement_count(&self) -> usize {
        self.matched_pairs.len() * 2 + self.unmatched_bank.len() + self.unmatched_ledger.len()
    }

    /// True when nothing was left over on either side
    pub fn is_fully_reconciled(&self) -> bool {
        self.unmatched_bank.is_empty() && self.unmatched_ledger.is_empty()
    }

    /// Counts and totals for reporting
    pub fn summary(&self) -> ReconciliationSummary {
        let matched_total: BigDecimal = self.matched_pairs.iter().map(|p| p.amount()).sum();
        let unmatched_bank_total: BigDecimal =
            self.unmatched_bank.iter().map(|m| &m.amount).sum();
        let unmatched_ledger_total: BigDecimal =
            self.unmatched_ledger.iter().map(|m| &m.amount).sum();
        let net_difference = &unmatched_bank_total - &unmatched_ledger_total;

        ReconciliationSummary {
            matched_count: self.matched_pairs.len(),
            unmatched_bank_count: self.unmatched_bank.len(),
            unmatched_ledger_count: self.unmatched_ledger.len(),
            matched_total,
            unmatched_bank_total,
            unmatched_ledger_total,
            net_difference,
        }
    }
}

/// Greedy, bank-first matcher.
///
/// Bank movements are visited in their given order and each one consumes at
/// most one ledger movement with the exact same amount whose date falls
/// within `tolerance_days`. Spreadsheet row order therefore decides which
/// candidate wins when several qualify. The result is not an optimal
/// bipartite matching: a bank movement may take a ledger movement that a
/// later bank movement would have matched more closely.
#[derive(Debug, Clone)]
pub struct ReconciliationMatcher {
    tolerance_days: i64,
    policy: MatchPolicy,
}

impl Default for ReconciliationMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_DAYS)
    }
}

impl ReconciliationMatcher {
    /// Create a first-fit matcher with the given tolerance
    pub fn new(tolerance_days: i64) -> Self {
        Self {
            tolerance_days: tolerance_days.max(0),
            policy: MatchPolicy::FirstFit,
        }
    }

    /// First-fit matcher using the configured tolerance
    pub fn from_config(config: &TaxConfig) -> Self {
        Self::new(config.tolerance_days)
    }

    /// Switch the candidate selection policy
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tolerance_days(&self) -> i64 {
        self.tolerance_days
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Partition both sides into matched pairs and leftovers.
    ///
    /// Every input movement ends up in exactly one output collection.
    #[instrument(name = "reconcile", skip_all, fields(bank = bank.len(), ledger = ledger.len()))]
    pub fn reconcile(&self, mut bank: Vec<Movement>, mut ledger: Vec<Movement>) -> MatchResult {
        for movement in bank.iter_mut().chain(ledger.iter_mut()) {
            movement.matched = false;
        }

        // (bank index, ledger index) in bank iteration order
        let mut pairs: Vec<(usize, usize)> = Vec::new();

        for (bank_idx, bank_movement) in bank.iter_mut().enumerate() {
            let Some(ledger_idx) = self.pick_candidate(bank_movement, &ledger) else {
                debug!(
                    row = bank_idx,
                    amount = %bank_movement.amount,
                    date = %bank_movement.date,
                    "no ledger candidate"
                );
                continue;
            };

            bank_movement.matched = true;
            ledger[ledger_idx].matched = true;
            debug!(
                row = bank_idx,
                ledger_row = ledger_idx,
                amount = %bank_movement.amount,
                "matched"
            );
            pairs.push((bank_idx, ledger_idx));
        }

        let result = Self::partition(bank, ledger, &pairs);

        info!(
            matched = result.matched_pairs.len(),
            unmatched_bank = result.unmatched_bank.len(),
            unmatched_ledger = result.unmatched_ledger.len(),
            "reconciliation finished"
        );

        result
    }

    /// Whether `ledger` could absorb `bank` under this matcher's rules
    pub fn is_candidate(&self, bank: &Movement, ledger: &Movement) -> bool {
        !ledger.matched
            && ledger.amount == bank.amount
            && bank.days_apart(ledger) <= self.tolerance_days
    }

    fn pick_candidate(&self, bank: &Movement, ledger: &[Movement]) -> Option<usize> {
        let mut candidates = ledger
            .iter()
            .enumerate()
            .filter(|(_, l)| self.is_candidate(bank, l));

        match self.policy {
            MatchPolicy::FirstFit => candidates.next().map(|(idx, _)| idx),
            // min_by_key keeps the first of equal keys, so ties go to position
            MatchPolicy::ClosestDate => candidates
                .min_by_key(|(_, l)| bank.days_apart(l))
                .map(|(idx, _)| idx),
        }
    }

    fn partition(
        bank: Vec<Movement>,
        ledger: Vec<Movement>,
        pairs: &[(usize, usize)],
    ) -> MatchResult {
        let mut bank_slots: Vec<Option<Movement>> = bank.into_iter().map(Some).collect();
        let mut ledger_slots: Vec<Option<Movement>> = ledger.into_iter().map(Some).collect();

        let matched_pairs = pairs
            .iter()
            .filter_map(|&(b, l)| {
                let bank = bank_slots[b].take()?;
                let ledger = ledger_slots[l].take()?;
                let days_apart = bank.days_apart(&ledger);
                Some(MatchedPair {
                    bank,
                    ledger,
                    days_apart,
                })
            })
            .collect();

        MatchResult {
            matched_pairs,
            unmatched_bank: bank_slots.into_iter().flatten().collect(),
            unmatched_ledger: ledger_slots.into_iter().flatten().collect(),
        }
    }
}
