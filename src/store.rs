//! Storage contract for credit applications.
//!
//! Persistence itself lives outside this crate. What the workflow needs from it
//! is an atomic compare-and-swap on the status, so that two institutions
//! claiming the same pending application cannot both succeed.

use dashmap::DashMap;
use hourglass_rs::SafeTimeProvider;

use crate::account::RepaymentAccount;
use crate::application::{ApplicationBuilder, CreditApplication};
use crate::config::PlatformConfig;
use crate::errors::{CreditError, Result};
use crate::events::EventStore;
use crate::permissions::Actor;
use crate::types::{ApplicationId, ApplicationStatus, UserId};
use crate::workflow::{transition_recorded, DashboardBuckets};

pub trait ApplicationStore: Send + Sync {
    fn insert(&self, application: CreditApplication) -> Result<()>;

    fn get(&self, id: ApplicationId) -> Result<CreditApplication>;

    fn list(&self) -> Vec<CreditApplication>;

    /// replace the stored record only if its status is still `expected`
    fn compare_and_swap(&self, expected: ApplicationStatus, updated: CreditApplication) -> Result<()>;

    /// a borrower's own applications, newest first
    fn list_by_borrower(&self, borrower: UserId) -> Vec<CreditApplication> {
        let mut mine: Vec<CreditApplication> = self
            .list()
            .into_iter()
            .filter(|a| a.borrower_id == borrower)
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine
    }
}

/// process-local store, used by tests and demos
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    applications: DashMap<ApplicationId, CreditApplication>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: CreditApplication) -> Result<()> {
        if self.applications.contains_key(&application.id) {
            return Err(CreditError::invalid_input(format!(
                "application {} already exists",
                application.id
            )));
        }
        self.applications.insert(application.id, application);
        Ok(())
    }

    fn get(&self, id: ApplicationId) -> Result<CreditApplication> {
        self.applications
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(CreditError::ApplicationNotFound { id })
    }

    fn list(&self) -> Vec<CreditApplication> {
        self.applications
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn compare_and_swap(&self, expected: ApplicationStatus, updated: CreditApplication) -> Result<()> {
        let id = updated.id;
        // the shard stays write-locked until `entry` drops
        let mut entry = self
            .applications
            .get_mut(&id)
            .ok_or(CreditError::ApplicationNotFound { id })?;

        if entry.status != expected {
            return Err(CreditError::StaleApplication {
                id,
                expected,
                found: entry.status,
            });
        }

        *entry = updated;
        Ok(())
    }
}

/// loads, transitions and saves applications on behalf of reviewer surfaces
pub struct ReviewDesk<'a, S: ApplicationStore> {
    store: &'a S,
    config: PlatformConfig,
}

impl<'a, S: ApplicationStore> ReviewDesk<'a, S> {
    pub fn new(store: &'a S, config: PlatformConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// validate a borrower's form and store it as a pending application
    pub fn submit(
        &self,
        form: ApplicationBuilder,
        borrower: &Actor,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CreditApplication> {
        let application = form.submit(borrower, &self.config, time_provider, events)?;
        self.store.insert(application.clone())?;
        Ok(application)
    }

    /// run a transition against the stored record and persist it atomically
    ///
    /// Events are only emitted once the swap has succeeded.
    pub fn apply(
        &self,
        id: ApplicationId,
        target: ApplicationStatus,
        actor: &Actor,
        rejection_reason: Option<&str>,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CreditApplication> {
        let mut staged = EventStore::new();
        let (expected, updated) =
            self.stage(id, target, actor, rejection_reason, time_provider, &mut staged)?;
        self.commit(expected, updated.clone(), actor, staged, events)?;
        Ok(updated)
    }

    fn stage(
        &self,
        id: ApplicationId,
        target: ApplicationStatus,
        actor: &Actor,
        rejection_reason: Option<&str>,
        time_provider: &SafeTimeProvider,
        staged: &mut EventStore,
    ) -> Result<(ApplicationStatus, CreditApplication)> {
        let current = self.store.get(id)?;
        let updated = transition_recorded(&current, target, actor, rejection_reason, time_provider, staged)?;
        Ok((current.status, updated))
    }

    fn commit(
        &self,
        expected: ApplicationStatus,
        updated: CreditApplication,
        actor: &Actor,
        mut staged: EventStore,
        events: &mut EventStore,
    ) -> Result<()> {
        let id = updated.id;
        if let Err(err) = self.store.compare_and_swap(expected, updated) {
            tracing::warn!(application_id = %id, actor = %actor, error = %err, "lost update race");
            return Err(err);
        }

        for event in staged.take_events() {
            events.emit(event);
        }
        Ok(())
    }

    pub fn claim(
        &self,
        id: ApplicationId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CreditApplication> {
        self.apply(id, ApplicationStatus::UnderReview, actor, None, time_provider, events)
    }

    /// approve and open the repayment account the approval triggers
    pub fn approve(
        &self,
        id: ApplicationId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<(CreditApplication, RepaymentAccount)> {
        let mut staged = EventStore::new();
        let (expected, approved) =
            self.stage(id, ApplicationStatus::Approved, actor, None, time_provider, &mut staged)?;
        // the account must open before the approval is persisted
        let account = RepaymentAccount::open(&approved, &self.config, time_provider, &mut staged)?;
        self.commit(expected, approved.clone(), actor, staged, events)?;
        Ok((approved, account))
    }

    pub fn reject(
        &self,
        id: ApplicationId,
        actor: &Actor,
        reason: &str,
        time_provider: &SafeTimeProvider,
        events: &mut EventStore,
    ) -> Result<CreditApplication> {
        self.apply(id, ApplicationStatus::Rejected, actor, Some(reason), time_provider, events)
    }

    pub fn dashboard(&self, institution: UserId) -> DashboardBuckets {
        DashboardBuckets::for_institution(&self.store.list(), institution)
    }
}
