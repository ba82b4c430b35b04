//! Tax and payroll configuration
//!
//! Every statutory figure the checks rely on lives here rather than in the
//! code. Defaults follow the 2024 values (UVT 47,065; transport allowance
//! 162,000) and can be overridden from a TOML document.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Value of one UVT used to derive the default thresholds
pub const DEFAULT_UVT: i64 = 47_065;

/// Build an exact decimal from an integer mantissa and a scale,
/// e.g. `rate(85, 3)` is `0.085`
pub(crate) fn rate(digits: i64, scale: i64) -> BigDecimal {
    BigDecimal::new(digits.into(), scale)
}

/// Employer payroll contribution rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollRates {
    /// Employer health contribution
    pub health: BigDecimal,
    /// Employer pension contribution
    pub pension: BigDecimal,
    /// SENA payroll tax
    pub sena: BigDecimal,
    /// ICBF payroll tax
    pub icbf: BigDecimal,
    /// Family compensation fund, due even for exempt employers
    pub compensation_fund: BigDecimal,
    /// Blended accrual for severance, severance interest, service bonus and vacations
    pub social_benefits: BigDecimal,
    /// Occupational risk rates for classes I through V
    pub risk_rates: Vec<BigDecimal>,
}

impl Default for PayrollRates {
    fn default() -> Self {
        Self {
            health: rate(85, 3),
            pension: rate(12, 2),
            sena: rate(2, 2),
            icbf: rate(3, 2),
            compensation_fund: rate(4, 2),
            social_benefits: rate(2183, 4),
            risk_rates: vec![
                rate(522, 5),
                rate(1044, 5),
                rate(2436, 5),
                rate(435, 4),
                rate(696, 4),
            ],
        }
    }
}

/// Complete configuration for audits, payroll and reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Largest cash payment accepted without a HIGH finding
    pub cash_ceiling: BigDecimal,
    /// Payment-method substrings (case-insensitive) that denote cash
    pub cash_keywords: Vec<String>,
    /// Withholding base for services
    pub withholding_service_base: BigDecimal,
    /// Withholding base for purchases, must exceed the service base
    pub withholding_purchase_base: BigDecimal,
    /// Share of total compensation non-salary payments may reach
    pub non_salary_cap: BigDecimal,
    /// Monthly transport allowance
    pub transport_allowance: BigDecimal,
    pub payroll: PayrollRates,
    /// Date tolerance for reconciliation matches
    pub tolerance_days: i64,
    /// Largest invoice batch accepted for extraction
    pub max_invoices_per_batch: usize,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            cash_ceiling: BigDecimal::from(100 * DEFAULT_UVT),
            cash_keywords: vec!["cash".to_string(), "efectivo".to_string()],
            withholding_service_base: BigDecimal::from(4 * DEFAULT_UVT),
            withholding_purchase_base: BigDecimal::from(27 * DEFAULT_UVT),
            non_salary_cap: rate(40, 2),
            transport_allowance: BigDecimal::from(162_000),
            payroll: PayrollRates::default(),
            tolerance_days: 3,
            max_invoices_per_batch: 10,
        }
    }
}

impl TaxConfig {
    /// Parse a configuration from TOML; missing fields keep their defaults
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: TaxConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the relationships between thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.withholding_service_base >= self.withholding_purchase_base {
            return Err(ConfigError::Invalid(format!(
                "service base ({}) must be below purchase base ({})",
                self.withholding_service_base, self.withholding_purchase_base
            )));
        }

        if self.payroll.risk_rates.len() != 5 {
            return Err(ConfigError::Invalid(format!(
                "expected 5 occupational risk rates, got {}",
                self.payroll.risk_rates.len()
            )));
        }

        if self.tolerance_days < 0 {
            return Err(ConfigError::Invalid(
                "tolerance_days cannot be negative".to_string(),
            ));
        }

        if self.cash_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "at least one cash keyword is required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_default_config_is_valid() {
        let config = TaxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cash_ceiling, BigDecimal::from(4_706_500));
        assert_eq!(config.withholding_service_base, BigDecimal::from(188_260));
        assert_eq!(config.withholding_purchase_base, BigDecimal::from(1_270_755));
        assert_eq!(config.tolerance_days, 3);
    }

    #[test]
    fn test_rate_helper() {
        assert_eq!(rate(85, 3), BigDecimal::from_str("0.085").unwrap());
        assert_eq!(rate(2183, 4), BigDecimal::from_str("0.2183").unwrap());
    }

    #[test]
    fn test_from_toml_overrides_and_defaults() {
        let config = TaxConfig::from_toml(
            r#"
            cash_ceiling = 5000000
            tolerance_days = 5

            [payroll]
            health = "0.09"
            "#,
        )
        .unwrap();

        assert_eq!(config.cash_ceiling, BigDecimal::from(5_000_000));
        assert_eq!(config.tolerance_days, 5);
        assert_eq!(config.payroll.health, BigDecimal::from_str("0.09").unwrap());
        // untouched fields keep defaults
        assert_eq!(config.payroll.pension, rate(12, 2));
        assert_eq!(config.max_invoices_per_batch, 10);
    }

    #[test]
    fn test_inverted_withholding_bases_rejected() {
        let result = TaxConfig::from_toml(
            r#"
            withholding_service_base = 2000000
            withholding_purchase_base = 1000000
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_short_risk_table_rejected() {
        let mut config = TaxConfig::default();
        config.payroll.risk_rates.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            TaxConfig::from_toml("cash_ceiling = ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
