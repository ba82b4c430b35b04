//! Employer payroll cost calculation

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{PayrollRates, TaxConfig};
use crate::types::*;

/// Occupational risk class, from minimal (I) to maximal (V)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RiskClass {
    I,
    II,
    III,
    IV,
    V,
}

impl RiskClass {
    /// Zero-based position in the rate table
    pub fn index(self) -> usize {
        match self {
            RiskClass::I => 0,
            RiskClass::II => 1,
            RiskClass::III => 2,
            RiskClass::IV => 3,
            RiskClass::V => 4,
        }
    }
}

impl TryFrom<u8> for RiskClass {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RiskClass::I),
            2 => Ok(RiskClass::II),
            3 => Ok(RiskClass::III),
            4 => Ok(RiskClass::IV),
            5 => Ok(RiskClass::V),
            other => Err(CoreError::Validation(format!(
                "risk class must be between 1 and 5, got {other}"
            ))),
        }
    }
}

impl From<RiskClass> for u8 {
    fn from(class: RiskClass) -> Self {
        class.index() as u8 + 1
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roman = match self {
            RiskClass::I => "I",
            RiskClass::II => "II",
            RiskClass::III => "III",
            RiskClass::IV => "IV",
            RiskClass::V => "V",
        };
        write!(f, "{roman}")
    }
}

/// Inputs for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollCostInput {
    pub base_salary: BigDecimal,
    /// Whether the employee is entitled to the transport allowance
    pub transport_allowance: bool,
    pub risk_class: RiskClass,
    /// Employer exempt from health and payroll-tax contributions
    pub exempt: bool,
}

/// Monthly employer cost breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollCost {
    pub base_salary: BigDecimal,
    pub transport_allowance: BigDecimal,
    /// The allowance never enters the contribution base
    pub contribution_base: BigDecimal,
    pub health: BigDecimal,
    pub pension: BigDecimal,
    pub occupational_risk: BigDecimal,
    pub sena: BigDecimal,
    pub icbf: BigDecimal,
    pub compensation_fund: BigDecimal,
    pub social_benefits: BigDecimal,
    pub total_employer_cost: BigDecimal,
}

impl PayrollCost {
    /// Sum of all social-security and payroll-tax contributions
    pub fn total_contributions(&self) -> BigDecimal {
        &self.health
            + &self.pension
            + &self.occupational_risk
            + &self.sena
            + &self.icbf
            + &self.compensation_fund
    }
}

/// Employer cost calculator
#[derive(Debug, Clone)]
pub struct PayrollCostCalculator {
    rates: PayrollRates,
    transport_allowance: BigDecimal,
}

impl Default for PayrollCostCalculator {
    fn default() -> Self {
        Self::from_config(&TaxConfig::default())
    }
}

impl PayrollCostCalculator {
    pub fn from_config(config: &TaxConfig) -> Self {
        Self {
            rates: config.payroll.clone(),
            transport_allowance: config.transport_allowance.clone(),
        }
    }

    /// Rate for a risk class
    pub fn risk_rate(&self, class: RiskClass) -> CoreResult<&BigDecimal> {
        self.rates.risk_rates.get(class.index()).ok_or_else(|| {
            CoreError::Validation(format!("no occupational risk rate configured for class {class}"))
        })
    }

    /// Compute the monthly employer cost for one employee
    pub fn calculate(&self, input: &PayrollCostInput) -> CoreResult<PayrollCost> {
        let zero = BigDecimal::from(0);
        let base = &input.base_salary;
        if *base < zero {
            return Err(CoreError::Validation(format!(
                "base salary must not be negative, got {base}"
            )));
        }

        let transport_allowance = if input.transport_allowance {
            self.transport_allowance.clone()
        } else {
            zero.clone()
        };
        let contribution_base = base.clone();

        let (health, sena, icbf) = if input.exempt {
            (zero.clone(), zero.clone(), zero)
        } else {
            (
                &contribution_base * &self.rates.health,
                &contribution_base * &self.rates.sena,
                &contribution_base * &self.rates.icbf,
            )
        };
        let pension = &contribution_base * &self.rates.pension;
        let occupational_risk = &contribution_base * self.risk_rate(input.risk_class)?;
        let compensation_fund = &contribution_base * &self.rates.compensation_fund;
        let social_benefits = (base + &transport_allowance) * &self.rates.social_benefits;

        let mut cost = PayrollCost {
            base_salary: base.clone(),
            transport_allowance,
            contribution_base,
            health,
            pension,
            occupational_risk,
            sena,
            icbf,
            compensation_fund,
            social_benefits,
            total_employer_cost: BigDecimal::from(0),
        };
        cost.total_employer_cost = &cost.base_salary
            + &cost.transport_allowance
            + cost.total_contributions()
            + &cost.social_benefits;

        Ok(cost)
    }
}
