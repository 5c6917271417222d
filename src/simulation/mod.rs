pub mod amortization;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{PlatformConfig, RateTable};
use crate::decimal::{round_half_up, Money, Rate};
use crate::errors::{CreditError, Result};
use crate::types::ProjectType;

pub use amortization::{AmortizationSchedule, ScheduledPayment};

/// inputs to the installment formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32) -> Result<Self> {
        let terms = Self {
            principal,
            annual_rate,
            term_months,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(CreditError::invalid_input(format!(
                "principal must be positive, got {}",
                self.principal
            )));
        }
        if self.term_months < 1 {
            return Err(CreditError::invalid_input("term must be at least one month"));
        }
        if self.annual_rate.is_negative() {
            return Err(CreditError::invalid_input(format!(
                "interest rate must not be negative, got {}",
                self.annual_rate
            )));
        }
        Ok(())
    }

    /// fixed monthly installment before rounding to centimos
    pub fn exact_installment(&self) -> Result<Decimal> {
        self.validate()?;

        let principal = self.principal.as_decimal();
        let r = self.annual_rate.monthly_rate().as_decimal();

        if r.is_zero() {
            return Ok(principal / Decimal::from(self.term_months));
        }

        // P * r * (1 + r)^n / ((1 + r)^n - 1)
        let compound = compound_factor(r, self.term_months)?;
        let denominator = compound - Decimal::ONE;
        if denominator.is_zero() {
            return Err(CreditError::invalid_input("monthly rate too small to amortize"));
        }

        principal
            .checked_mul(r)
            .and_then(|v| v.checked_mul(compound))
            .and_then(|v| v.checked_div(denominator))
            .ok_or_else(|| CreditError::invalid_input("installment is not representable"))
    }
}

/// (1 + r)^n, failing instead of overflowing
fn compound_factor(r: Decimal, n: u32) -> Result<Decimal> {
    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..n {
        compound = compound
            .checked_mul(base)
            .ok_or_else(|| CreditError::invalid_input("compounding overflowed"))?;
    }
    Ok(compound)
}

/// outcome of a loan simulation, shaped like the public simulator response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub principal: Money,
    pub term_months: u32,
    /// nominal annual rate in percentage points
    pub interest_rate: Decimal,
    pub monthly_payment: Money,
    pub total_amount: Money,
    pub total_interest: Money,
    /// compounded annual rate in percentage points, 2 dp
    pub effective_annual_rate: Decimal,
}

impl SimulationResult {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CreditError::invalid_input(e.to_string()))
    }
}

/// compute installment, totals and effective rate for fixed loan terms
pub fn amortize(terms: &LoanTerms) -> Result<SimulationResult> {
    let exact = terms.exact_installment()?;
    let n = Decimal::from(terms.term_months);

    let exact_total = exact
        .checked_mul(n)
        .ok_or_else(|| CreditError::invalid_input("total amount is not representable"))?;

    let monthly_payment = Money::from_decimal(exact);
    let total_amount = Money::from_decimal(exact_total);
    let total_interest = total_amount - terms.principal;

    let r = terms.annual_rate.monthly_rate().as_decimal();
    let effective = (compound_factor(r, 12)? - Decimal::ONE)
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| CreditError::invalid_input("effective rate is not representable"))?;

    Ok(SimulationResult {
        principal: terms.principal,
        term_months: terms.term_months,
        interest_rate: terms.annual_rate.as_percentage(),
        monthly_payment,
        total_amount,
        total_interest,
        effective_annual_rate: round_half_up(effective, 2),
    })
}

/// loan simulator priced from a rate table
#[derive(Debug, Clone)]
pub struct Simulator {
    rate_table: RateTable,
    max_term_months: u32,
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator::new(&PlatformConfig::default())
    }
}

impl Simulator {
    pub fn new(config: &PlatformConfig) -> Self {
        Self {
            rate_table: config.rate_table.clone(),
            max_term_months: config.max_term_months,
        }
    }

    pub fn rate_table(&self) -> &RateTable {
        &self.rate_table
    }

    /// price and amortize a loan for the declared project type
    pub fn simulate(
        &self,
        principal: Money,
        term_months: u32,
        project_type: ProjectType,
    ) -> Result<SimulationResult> {
        if term_months > self.max_term_months {
            return Err(CreditError::invalid_input(format!(
                "term of {} months exceeds the maximum of {}",
                term_months, self.max_term_months
            )));
        }

        let rate = self.rate_table.annual_rate(project_type);
        let terms = LoanTerms::new(principal, rate, term_months)?;
        amortize(&terms)
    }

    /// simulate from the loosely typed fields a form submits
    pub fn simulate_raw(
        &self,
        principal: &str,
        term_months: &str,
        project_type: Option<&str>,
    ) -> Result<SimulationResult> {
        let principal = Money::from_str_exact(principal.trim())
            .map_err(|e| CreditError::invalid_input(format!("principal: {}", e)))?;
        let term_months: u32 = term_months
            .trim()
            .parse()
            .map_err(|_| CreditError::invalid_input(format!("term: {:?} is not a month count", term_months)))?;
        let project_type = project_type
            .map(ProjectType::parse)
            .unwrap_or(ProjectType::Unknown);

        self.simulate(principal, term_months, project_type)
    }
}

/// simulate with the built-in rate table
pub fn simulate(
    principal: Money,
    term_months: u32,
    project_type: ProjectType,
) -> Result<SimulationResult> {
    Simulator::default().simulate(principal, term_months, project_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_corn_example() {
        let result = simulate(Money::from_major(750_000), 12, ProjectType::Corn).unwrap();

        assert_eq!(result.interest_rate, dec!(14));
        assert_eq!(result.monthly_payment, Money::from_str_exact("67340.34").unwrap());
        assert_eq!(result.total_amount, Money::from_str_exact("808084.06").unwrap());
        assert_eq!(result.total_interest, Money::from_str_exact("58084.06").unwrap());
        assert_eq!(result.effective_annual_rate, dec!(14.93));
    }

    #[test]
    fn test_rate_lookup_drives_pricing() {
        let principal = Money::from_major(100_000);
        let cattle = simulate(principal, 24, ProjectType::Cattle).unwrap();
        let other = simulate(principal, 24, ProjectType::Other).unwrap();
        let unknown = simulate(principal, 24, ProjectType::Unknown).unwrap();

        assert_eq!(cattle.interest_rate, dec!(13));
        assert_eq!(other.interest_rate, dec!(18));
        assert_eq!(unknown.interest_rate, dec!(15));
        assert_eq!(cattle.monthly_payment, Money::from_str_exact("4754.18").unwrap());
        assert!(cattle.monthly_payment < unknown.monthly_payment);
        assert!(unknown.monthly_payment < other.monthly_payment);
    }

    #[test]
    fn test_totals_are_consistent() {
        let cases = [
            (Money::from_major(750_000), 12, ProjectType::Corn),
            (Money::from_major(5_000_000), 36, ProjectType::Corn),
            (Money::from_major(2_500_000), 24, ProjectType::Cattle),
            (Money::from_str_exact("999.99").unwrap(), 7, ProjectType::Poultry),
            (Money::from_major(1), 60, ProjectType::Other),
        ];

        for (principal, term, project) in cases {
            let result = simulate(principal, term, project).unwrap();
            let n = Decimal::from(term);

            // one centimo of rounding per installment at most
            let drift = (result.monthly_payment.as_decimal() * n - result.total_amount.as_decimal()).abs();
            assert!(drift <= dec!(0.01) * n, "drift {} for {:?}", drift, (principal, term, project));

            assert_eq!(result.total_interest, result.total_amount - principal);
        }
    }

    #[test]
    fn test_zero_rate_divides_evenly() {
        let terms = LoanTerms::new(Money::from_major(1_200), Rate::ZERO, 12).unwrap();
        let result = amortize(&terms).unwrap();

        assert_eq!(result.monthly_payment, Money::from_major(100));
        assert_eq!(result.total_amount, Money::from_major(1_200));
        assert_eq!(result.total_interest, Money::ZERO);
        assert_eq!(result.effective_annual_rate, Decimal::ZERO);
    }

    #[test]
    fn test_single_month_term() {
        let terms = LoanTerms::new(Money::from_major(1_000), Rate::from_percentage(dec!(18)), 1).unwrap();
        let result = amortize(&terms).unwrap();

        assert_eq!(result.monthly_payment, Money::from_major(1_015));
        assert_eq!(result.total_interest, Money::from_major(15));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            simulate(Money::ZERO, 12, ProjectType::Corn),
            Err(CreditError::InvalidInput { .. })
        ));
        assert!(matches!(
            simulate(Money::from_major(-5), 12, ProjectType::Corn),
            Err(CreditError::InvalidInput { .. })
        ));
        assert!(matches!(
            simulate(Money::from_major(1_000), 0, ProjectType::Corn),
            Err(CreditError::InvalidInput { .. })
        ));
        assert!(matches!(
            LoanTerms::new(Money::from_major(1_000), Rate::from_percentage(dec!(-1)), 12),
            Err(CreditError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported_not_panicked() {
        let terms = LoanTerms {
            principal: Money::from_major(1_000_000),
            annual_rate: Rate::from_percentage(dec!(900)),
            term_months: 5_000,
        };
        assert!(matches!(amortize(&terms), Err(CreditError::InvalidInput { .. })));
    }

    #[test]
    fn test_term_limit_from_config() {
        let config = PlatformConfig {
            max_term_months: 60,
            ..PlatformConfig::default()
        };
        let simulator = Simulator::new(&config);

        assert!(simulator.simulate(Money::from_major(10_000), 60, ProjectType::Corn).is_ok());
        assert!(simulator.simulate(Money::from_major(10_000), 61, ProjectType::Corn).is_err());
    }

    #[test]
    fn test_simulate_raw_form_fields() {
        let simulator = Simulator::default();
        let result = simulator.simulate_raw("750000", "12", Some("corn")).unwrap();
        assert_eq!(result.interest_rate, dec!(14));

        let fallback = simulator.simulate_raw("750000", "12", Some("goats")).unwrap();
        assert_eq!(fallback.interest_rate, dec!(15));

        assert!(simulator.simulate_raw("abc", "12", None).is_err());
        assert!(simulator.simulate_raw("1000", "twelve", None).is_err());
    }

    #[test]
    fn test_result_json_shape() {
        let result = simulate(Money::from_major(750_000), 12, ProjectType::Corn).unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["monthlyPayment"], "67340.34");
        assert_eq!(json["interestRate"], "14");
        assert!(json.get("totalInterest").is_some());
        assert!(json.get("effectiveAnnualRate").is_some());
    }
}
