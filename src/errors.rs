use thiserror::Error;

use crate::decimal::Money;
use crate::types::{ApplicationId, ApplicationStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreditError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("rejection requires a non-empty reason")]
    MissingRejectionReason,

    #[error("actor {actor} may not {action}")]
    UnauthorizedActor {
        actor: String,
        action: String,
    },

    #[error("application {id} changed concurrently: expected {expected}, found {found}")]
    StaleApplication {
        id: ApplicationId,
        expected: ApplicationStatus,
        found: ApplicationStatus,
    },

    #[error("application not found: {id}")]
    ApplicationNotFound {
        id: ApplicationId,
    },

    #[error("account is no longer active")]
    AccountInactive,

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl CreditError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        CreditError::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CreditError>;
