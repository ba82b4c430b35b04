//! # Contador Core
//!
//! Computational core for Colombian accounting dashboards: bank
//! reconciliation, withholding and payroll audits, employer payroll cost,
//! NIT check digits and purchase-invoice batches.
//!
//! ## Features
//!
//! - **Reconciliation**: greedy bank-first matching on exact amount within a date window
//! - **Threshold audits**: cash ceiling, withholding bases and the 40 % non-salary rule
//! - **Payroll cost**: employer contributions, payroll taxes and benefit accruals
//! - **NIT check digit**: weighted modulus-11 DV computation and verification
//! - **Invoice batches**: UBL XML extraction and generator-assisted image extraction
//! - **Collaborator traits**: spreadsheet reading and text generation stay outside the core
//!
//! ## Quick Start
//!
//! ```rust
//! use contador_core::{Movement, ReconciliationMatcher};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! let bank = vec![Movement::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     BigDecimal::from(100),
//!     "Deposit",
//! )];
//! let ledger = vec![Movement::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
//!     BigDecimal::from(100),
//!     "Receipt 001",
//! )];
//!
//! let result = ReconciliationMatcher::default().reconcile(bank, ledger);
//! assert_eq!(result.matched_pairs.len(), 1);
//! assert_eq!(contador_core::check_digit("900123456").unwrap(), 8);
//! ```

pub mod config;
pub mod export;
pub mod import;
pub mod invoice;
pub mod narrative;
pub mod payroll;
pub mod reconciliation;
pub mod session;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use payroll::*;
pub use reconciliation::*;
pub use session::*;
pub use tax::*;
pub use traits::*;
pub use types::*;
