use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};
use crate::simulation::{amortize, LoanTerms};

/// one installment of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub due_date: DateTime<Utc>,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub ending_balance: Money,
    pub cumulative_interest: Money,
    pub cumulative_principal: Money,
}

/// month-by-month repayment plan at a fixed installment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub start_date: DateTime<Utc>,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the schedule; installment `i` falls due `i` months after `start_date`
    pub fn generate(terms: &LoanTerms, start_date: DateTime<Utc>) -> Result<Self> {
        let installment = amortize(terms)?.monthly_payment;
        let monthly_rate = terms.annual_rate.monthly_rate().as_decimal();

        let mut payments = Vec::with_capacity(terms.term_months as usize);
        let mut balance = terms.principal;
        let mut cumulative_interest = Money::ZERO;
        let mut cumulative_principal = Money::ZERO;

        for i in 1..=terms.term_months {
            let due_date = add_months(start_date, i)?;
            let interest_portion = Money::from_decimal(balance.as_decimal() * monthly_rate);
            let is_last = i == terms.term_months;

            // last installment clears whatever rounding left behind
            let (principal_portion, payment_amount) = if is_last {
                (balance, balance + interest_portion)
            } else {
                let principal_portion = (installment - interest_portion).min(balance);
                (principal_portion, principal_portion + interest_portion)
            };

            cumulative_interest += interest_portion;
            cumulative_principal += principal_portion;
            let ending_balance = balance - principal_portion;

            payments.push(ScheduledPayment {
                payment_number: i,
                due_date,
                beginning_balance: balance,
                payment_amount,
                principal_portion,
                interest_portion,
                ending_balance,
                cumulative_interest,
                cumulative_principal,
            });

            balance = ending_balance;
        }

        let total_interest = cumulative_interest;
        let total_payment = payments
            .iter()
            .map(|p| p.payment_amount)
            .fold(Money::ZERO, |acc, x| acc + x);

        Ok(Self {
            principal: terms.principal,
            interest_rate: terms.annual_rate,
            term_months: terms.term_months,
            start_date,
            payments,
            total_interest,
            total_payment,
        })
    }

    /// get payment for a 1-based installment number
    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|idx| self.payments.get(idx as usize))
    }

    /// balance left once the given installment is paid
    pub fn balance_after_payment(&self, payment_number: u32) -> Money {
        self.get_payment(payment_number)
            .map(|p| p.ending_balance)
            .unwrap_or(self.principal)
    }

    /// first installment falling due strictly after `date`
    pub fn next_due_after(&self, date: DateTime<Utc>) -> Option<&ScheduledPayment> {
        self.payments.iter().find(|p| p.due_date > date)
    }
}

/// calendar month arithmetic; end-of-month dates clamp (Jan 31 -> Feb 28/29)
pub(crate) fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| CreditError::invalid_input(format!("date overflow adding {} months", months)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_schedule_amortizes_to_zero() {
        let terms = LoanTerms::new(
            Money::from_major(750_000),
            Rate::from_percentage(dec!(14)),
            12,
        )
        .unwrap();
        let schedule = AmortizationSchedule::generate(&terms, start()).unwrap();

        assert_eq!(schedule.payments.len(), 12);

        let first = schedule.get_payment(1).unwrap();
        assert_eq!(first.beginning_balance, terms.principal);
        assert_eq!(first.payment_amount, Money::from_str_exact("67340.34").unwrap());
        assert_eq!(first.interest_portion, Money::from_major(8_750));

        let last = schedule.get_payment(12).unwrap();
        assert_eq!(last.ending_balance, Money::ZERO);
        assert_eq!(last.cumulative_principal, terms.principal);
        assert!((last.payment_amount - first.payment_amount).abs() < Money::from_major(1));

        assert_eq!(schedule.total_payment, terms.principal + schedule.total_interest);
    }

    #[test]
    fn test_interest_declines_each_month() {
        let terms = LoanTerms::new(
            Money::from_major(2_500_000),
            Rate::from_percentage(dec!(13)),
            24,
        )
        .unwrap();
        let schedule = AmortizationSchedule::generate(&terms, start()).unwrap();

        for pair in schedule.payments.windows(2) {
            assert!(pair[1].interest_portion < pair[0].interest_portion);
            assert!(pair[1].principal_portion > pair[0].principal_portion);
        }
    }

    #[test]
    fn test_due_dates_follow_calendar_months() {
        let terms = LoanTerms::new(Money::from_major(12_000), Rate::ZERO, 3).unwrap();
        let schedule = AmortizationSchedule::generate(&terms, start()).unwrap();

        let dates: Vec<(u32, u32)> = schedule
            .payments
            .iter()
            .map(|p| (p.due_date.month(), p.due_date.day()))
            .collect();
        assert_eq!(dates, vec![(2, 29), (3, 31), (4, 30)]);

        for payment in &schedule.payments {
            assert_eq!(payment.payment_amount, Money::from_major(4_000));
            assert_eq!(payment.interest_portion, Money::ZERO);
        }
    }

    #[test]
    fn test_lookup_helpers() {
        let terms = LoanTerms::new(Money::from_major(12_000), Rate::ZERO, 3).unwrap();
        let schedule = AmortizationSchedule::generate(&terms, start()).unwrap();

        assert!(schedule.get_payment(0).is_none());
        assert!(schedule.get_payment(4).is_none());
        assert_eq!(schedule.balance_after_payment(1), Money::from_major(8_000));
        assert_eq!(schedule.balance_after_payment(0), Money::from_major(12_000));

        let next = schedule.next_due_after(start() + chrono::Duration::days(40)).unwrap();
        assert_eq!(next.payment_number, 2);
    }
}
