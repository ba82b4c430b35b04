//! Colombian tax checks: threshold audits and NIT check digits

pub mod audit;
pub mod nit;

pub use audit::*;
pub use nit::{check_digit, format_nit, verify_nit, NitError};
