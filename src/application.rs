use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PlatformConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};
use crate::events::{Event, EventStore};
use crate::permissions::{Actor, Permission};
use crate::simulation::{amortize, LoanTerms, SimulationResult, Simulator};
use crate::types::{ApplicationId, ApplicationStatus, ProjectType, UserId};

/// a borrower's request for credit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditApplication {
    pub id: ApplicationId,
    pub borrower_id: UserId,
    pub project_name: String,
    pub project_type: ProjectType,
    pub description: String,
    pub amount: Money,
    pub term_months: u32,
    /// priced from the rate table at submission
    pub interest_rate: Rate,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    /// institution that claimed the application
    pub reviewed_by: Option<UserId>,
    pub approved_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditApplication {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// true once `institution` has claimed or decided this application
    pub fn is_reviewed_by(&self, institution: UserId) -> bool {
        self.reviewed_by == Some(institution)
    }

    pub fn loan_terms(&self) -> Result<LoanTerms> {
        LoanTerms::new(self.amount, self.interest_rate, self.term_months)
    }

    /// repayment figures at the rate the application was priced at
    pub fn simulate(&self) -> Result<SimulationResult> {
        amortize(&self.loan_terms()?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CreditError::invalid_input(e.to_string()))
    }
}

/// collects and validates the fields of the borrower's application form
#[derive(Debug, Clone, Default)]
pub struct ApplicationBuilder {
    project_name: Option<String>,
    project_type: Option<ProjectType>,
    description: Option<String>,
    amount: Option<Money>,
    term_months: Option<u32>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    pub fn project_type(mut self, project_type: ProjectType) -> Self {
        self.project_type = Some(project_type);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    /// validate and create a pending application owned by `borrower`
    pub fn submit(
        self,
        borrower: &Actor,
        config: &PlatformConfig,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CreditApplication> {
        if !borrower.has_permission(Permission::ApplicationsCreate) {
            return Err(CreditError::UnauthorizedActor {
                actor: borrower.to_string(),
                action: "submit credit applications".to_string(),
            });
        }

        let project_name = required_text(self.project_name, "project name")?;
        let description = required_text(self.description, "description")?;
        let project_type = self.project_type.unwrap_or(ProjectType::Unknown);

        let amount = self
            .amount
            .ok_or_else(|| CreditError::invalid_input("amount is required"))?;
        let term_months = self
            .term_months
            .ok_or_else(|| CreditError::invalid_input("term is required"))?;

        // anything the simulator refuses, including the term limit, cannot be submitted
        Simulator::new(config).simulate(amount, term_months, project_type)?;
        let interest_rate = config.rate_table.annual_rate(project_type);

        let now = time_provider.now();
        let application = CreditApplication {
            id: Uuid::new_v4(),
            borrower_id: borrower.id,
            project_name,
            project_type,
            description,
            amount,
            term_months,
            interest_rate,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };

        events.emit(Event::ApplicationSubmitted {
            application_id: application.id,
            borrower_id: borrower.id,
            project_type,
            amount,
            term_months,
            timestamp: now,
        });

        tracing::info!(
            application_id = %application.id,
            borrower = %borrower.id,
            project_type = %project_type,
            amount = %amount,
            term_months,
            "credit application submitted"
        );

        Ok(application)
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(CreditError::invalid_input(format!("{} is required", field)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    fn corn_form() -> ApplicationBuilder {
        CreditApplication::builder()
            .project_name("Cultivo de Milho")
            .project_type(ProjectType::Corn)
            .description("5 hectares de milho na época das chuvas")
            .amount(Money::from_major(750_000))
            .term_months(12)
    }

    #[test]
    fn test_submit_creates_pending_application() {
        let time = time();
        let mut events = EventStore::new();
        let farmer = Actor::farmer(Uuid::new_v4());

        let app = corn_form()
            .submit(&farmer, &PlatformConfig::default(), &time, &mut events)
            .unwrap();

        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.borrower_id, farmer.id);
        assert_eq!(app.interest_rate.as_percentage(), dec!(14));
        assert_eq!(app.created_at, time.now());
        assert!(app.reviewed_by.is_none());
        assert!(app.approved_by.is_none());

        assert_eq!(events.len(), 1);
        assert!(matches!(events.events()[0], Event::ApplicationSubmitted { .. }));
    }

    #[test]
    fn test_application_simulates_at_its_own_rate() {
        let time = time();
        let mut events = EventStore::new();
        let farmer = Actor::farmer(Uuid::new_v4());

        let app = corn_form()
            .submit(&farmer, &PlatformConfig::default(), &time, &mut events)
            .unwrap();

        let result = app.simulate().unwrap();
        assert_eq!(result.monthly_payment, Money::from_str_exact("67340.34").unwrap());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let time = time();
        let mut events = EventStore::new();
        let farmer = Actor::farmer(Uuid::new_v4());
        let config = PlatformConfig::default();

        let blank_name = corn_form().project_name("   ");
        assert!(matches!(
            blank_name.submit(&farmer, &config, &time, &mut events),
            Err(CreditError::InvalidInput { .. })
        ));

        let no_amount = CreditApplication::builder()
            .project_name("Mandioca")
            .description("3 hectares")
            .term_months(18);
        assert!(no_amount.submit(&farmer, &config, &time, &mut events).is_err());

        let zero_term = corn_form().term_months(0);
        assert!(zero_term.submit(&farmer, &config, &time, &mut events).is_err());

        assert!(events.is_empty());
    }

    #[test]
    fn test_terms_the_simulator_refuses_are_rejected() {
        let time = time();
        let mut events = EventStore::new();
        let farmer = Actor::farmer(Uuid::new_v4());
        let config = PlatformConfig::default();

        let too_long = corn_form().term_months(config.max_term_months + 1);
        assert!(matches!(
            too_long.submit(&farmer, &config, &time, &mut events),
            Err(CreditError::InvalidInput { .. })
        ));

        // within a raised limit, but the installment no longer fits a decimal
        let lenient = PlatformConfig {
            max_term_months: 6_000,
            ..PlatformConfig::default()
        };
        let overflowing = CreditApplication::builder()
            .project_name("Outro")
            .project_type(ProjectType::Other)
            .description("prazo extremo")
            .amount(Money::from_major(1_000))
            .term_months(6_000);
        assert!(overflowing.submit(&farmer, &lenient, &time, &mut events).is_err());

        assert!(events.is_empty());
    }

    #[test]
    fn test_institutions_cannot_submit() {
        let time = time();
        let mut events = EventStore::new();
        let bank = Actor::institution(Uuid::new_v4());

        assert!(matches!(
            corn_form().submit(&bank, &PlatformConfig::default(), &time, &mut events),
            Err(CreditError::UnauthorizedActor { .. })
        ));
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        let time = time();
        let mut events = EventStore::new();
        let farmer = Actor::farmer(Uuid::new_v4());

        let app = corn_form()
            .submit(&farmer, &PlatformConfig::default(), &time, &mut events)
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&app.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["projectType"], "corn");
        assert_eq!(json["amount"], "750000");
        assert!(json["rejectionReason"].is_null());
    }
}
