use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::CreditApplication;
use crate::config::PlatformConfig;
use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::events::{Event, EventStore};
use crate::simulation::amortization::add_months;
use crate::simulation::AmortizationSchedule;
use crate::types::{AccountId, ApplicationId, ApplicationStatus, UserId};

/// a single repayment received on an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
}

/// the repayment account opened for an approved application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentAccount {
    pub id: AccountId,
    pub application_id: ApplicationId,
    pub borrower_id: UserId,
    pub institution_id: UserId,
    pub total_amount: Money,
    pub outstanding_balance: Money,
    pub monthly_payment: Money,
    pub next_payment_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub payments: Vec<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepaymentAccount {
    /// open the account for an approved application
    pub fn open(
        application: &CreditApplication,
        config: &PlatformConfig,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Self> {
        if application.status != ApplicationStatus::Approved {
            return Err(CreditError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Approved,
            });
        }

        let institution_id = application
            .approved_by
            .ok_or_else(|| CreditError::invalid_input("approved application has no approver"))?;

        let simulation = application.simulate()?;
        let now = time_provider.now();
        let first_payment = add_months(now, config.first_payment_offset_months)?;

        let account = Self {
            id: Uuid::new_v4(),
            application_id: application.id,
            borrower_id: application.borrower_id,
            institution_id,
            total_amount: simulation.total_amount,
            outstanding_balance: simulation.total_amount,
            monthly_payment: simulation.monthly_payment,
            next_payment_date: Some(first_payment),
            is_active: true,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        events.emit(Event::AccountOpened {
            account_id: account.id,
            application_id: application.id,
            institution_id,
            total_amount: account.total_amount,
            monthly_payment: account.monthly_payment,
            first_payment_due: first_payment,
        });

        tracing::info!(
            account_id = %account.id,
            application_id = %application.id,
            total = %account.total_amount,
            monthly = %account.monthly_payment,
            "repayment account opened"
        );

        Ok(account)
    }

    /// apply a repayment; returns the balance still owed
    pub fn record_payment(
        &mut self,
        amount: Money,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<Money> {
        if !amount.is_positive() {
            return Err(CreditError::InvalidPaymentAmount { amount });
        }
        if !self.is_active {
            return Err(CreditError::AccountInactive);
        }

        let now = time_provider.now();
        let total_paid = self
            .total_paid()?
            .checked_add(amount)
            .ok_or_else(|| CreditError::invalid_input("total paid is not representable"))?;
        let outstanding = (self.outstanding_balance - amount).max(Money::ZERO);
        let next_payment_date = if outstanding.is_zero() {
            None
        } else {
            self.next_payment_date.map(|due| add_months(due, 1)).transpose()?
        };

        self.payments.push(Payment {
            id: Uuid::new_v4(),
            amount,
            payment_date: now,
        });
        self.outstanding_balance = outstanding;
        self.next_payment_date = next_payment_date;
        self.updated_at = now;

        events.emit(Event::PaymentReceived {
            account_id: self.id,
            amount,
            outstanding_balance: outstanding,
            timestamp: now,
        });

        if outstanding.is_zero() {
            self.is_active = false;

            events.emit(Event::AccountSettled {
                account_id: self.id,
                total_paid,
                timestamp: now,
            });
            tracing::info!(account_id = %self.id, "repayment account settled");
        } else {
            tracing::debug!(
                account_id = %self.id,
                %amount,
                outstanding = %outstanding,
                "payment recorded"
            );
        }

        Ok(outstanding)
    }

    /// sum of every payment received, including any overpayment
    pub fn total_paid(&self) -> Result<Money> {
        self.payments.iter().try_fold(Money::ZERO, |acc, p| {
            acc.checked_add(p.amount)
                .ok_or_else(|| CreditError::invalid_input("total paid is not representable"))
        })
    }

    pub fn payments_made(&self) -> usize {
        self.payments.len()
    }

    /// payment history, most recent first
    pub fn payment_history(&self) -> Vec<&Payment> {
        let mut history: Vec<&Payment> = self.payments.iter().collect();
        history.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        history
    }

    /// installment breakdown for the account's loan
    pub fn schedule(&self, application: &CreditApplication) -> Result<AmortizationSchedule> {
        AmortizationSchedule::generate(&application.loan_terms()?, self.created_at)
    }
}
