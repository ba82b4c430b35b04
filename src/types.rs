//! Core types and data structures shared across the crate

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dated, valued line from either a bank statement or the accounting ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Calendar date of the movement
    pub date: NaiveDate,
    /// Signed amount; exact equality is the reconciliation key
    pub amount: BigDecimal,
    /// Free-text label, carried through for reporting only
    pub description: String,
    /// Set once the movement has been consumed by a match
    pub matched: bool,
}

impl Movement {
    /// Create a new, unmatched movement
    pub fn new(date: NaiveDate, amount: BigDecimal, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
            matched: false,
        }
    }

    /// Absolute distance in days between two movements
    pub fn days_apart(&self, other: &Movement) -> i64 {
        (self.date - other.date).num_days().abs()
    }
}

/// Severity tier of an audit finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Which withholding band an amount fell into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithholdingBand {
    /// At or above the service base, below the purchase base
    Services,
    /// At or above the purchase base
    Purchases,
}

impl fmt::Display for WithholdingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WithholdingBand::Services => write!(f, "services"),
            WithholdingBand::Purchases => write!(f, "purchases"),
        }
    }
}

/// Structured payload of a finding, so exports and prompts don't have to
/// parse the human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum FindingKind {
    CashCeiling {
        amount: BigDecimal,
        ceiling: BigDecimal,
    },
    WithholdingBase {
        amount: BigDecimal,
        band: WithholdingBand,
        threshold: BigDecimal,
    },
    NonSalaryRatio {
        limit: BigDecimal,
        excess: BigDecimal,
        adjusted_base: BigDecimal,
    },
}

/// A single flag raised by an audit check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Human-readable description of the flag
    pub message: String,
    pub severity: Severity,
    pub kind: FindingKind,
}

/// Errors that can occur in the core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Import error: {0}")]
    Import(#[from] crate::import::ImportError),
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
    #[error("Invalid NIT: {0}")]
    Nit(#[from] crate::tax::nit::NitError),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
