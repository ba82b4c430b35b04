//! Reconciliation of bank statements against the accounting ledger
//!
//! A run takes the movements read from both spreadsheets, pairs those with
//! the same amount and nearby dates, and reports what is left on each side.

pub mod matcher;

pub use matcher::*;
