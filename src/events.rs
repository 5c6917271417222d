use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AccountId, ApplicationId, ApplicationStatus, ProjectType, UserId};

/// everything the credit core records for audit and notification fan-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // application events
    ApplicationSubmitted {
        application_id: ApplicationId,
        borrower_id: UserId,
        project_type: ProjectType,
        amount: Money,
        term_months: u32,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        application_id: ApplicationId,
        old_status: ApplicationStatus,
        new_status: ApplicationStatus,
        actor_id: UserId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },

    // account events
    AccountOpened {
        account_id: AccountId,
        application_id: ApplicationId,
        institution_id: UserId,
        total_amount: Money,
        monthly_payment: Money,
        first_payment_due: DateTime<Utc>,
    },
    PaymentReceived {
        account_id: AccountId,
        amount: Money,
        outstanding_balance: Money,
        timestamp: DateTime<Utc>,
    },
    AccountSettled {
        account_id: AccountId,
        total_paid: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
