//! Payroll: employer cost build-up

pub mod cost;

pub use cost::*;
