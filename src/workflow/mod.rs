//! The single place where credit-application status changes are decided.
//!
//! ```text
//! pending ──claim──> under_review ──approve──> approved
//!    │                    │
//!    └──────reject────────┴──────reject──────> rejected
//! ```
//!
//! `approved` and `rejected` are terminal. Every reviewer surface goes through
//! [`transition`]; persistence and the claim race are handled by
//! [`crate::store`].

pub mod buckets;

use hourglass_rs::SafeTimeProvider;

use crate::application::CreditApplication;
use crate::errors::{CreditError, Result};
use crate::events::{Event, EventStore};
use crate::permissions::{Actor, Permission};
use crate::types::ApplicationStatus;

pub use buckets::{Bucket, DashboardBuckets};

/// apply a status change to a copy of `application`
///
/// The input is never modified, so a failed guard leaves no partial update.
/// Only `status`, `rejection_reason`, `reviewed_by`, `approved_by` and
/// `updated_at` can differ between input and output.
pub fn transition(
    application: &CreditApplication,
    target: ApplicationStatus,
    actor: &Actor,
    rejection_reason: Option<&str>,
    time_provider: &SafeTimeProvider,
) -> Result<CreditApplication> {
    use crate::types::ApplicationStatus::*;

    let from = application.status;
    let invalid = CreditError::InvalidTransition { from, to: target };

    if from.is_terminal() {
        tracing::debug!(application_id = %application.id, %from, to = %target, "terminal application cannot move");
        return Err(invalid);
    }

    let mut updated = application.clone();

    match (from, target) {
        (Pending, UnderReview) => {
            if !actor.can_review() {
                return Err(unauthorized(actor, "claim applications for review"));
            }
            updated.reviewed_by = Some(actor.id);
        }
        (UnderReview, Approved) => {
            if !actor.has_permission(Permission::ApplicationsApprove) {
                return Err(unauthorized(actor, "approve applications"));
            }
            ensure_owner(application, actor, "approve")?;
            updated.approved_by = Some(actor.id);
        }
        (Pending, Rejected) | (UnderReview, Rejected) => {
            let reason = rejection_reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or(CreditError::MissingRejectionReason)?;

            if !actor.can_review() || !actor.has_permission(Permission::ApplicationsReject) {
                return Err(unauthorized(actor, "reject applications"));
            }
            if from == UnderReview {
                ensure_owner(application, actor, "reject")?;
            }

            updated.rejection_reason = Some(reason.to_string());
            // a claimed application keeps its claimer; the decider is on the event
            updated.reviewed_by.get_or_insert(actor.id);
        }
        _ => return Err(invalid),
    }

    updated.status = target;
    updated.updated_at = time_provider.now();

    tracing::info!(
        application_id = %application.id,
        %from,
        to = %target,
        actor = %actor,
        "application status changed"
    );

    Ok(updated)
}

/// [`transition`] plus the audit event describing it
pub fn transition_recorded(
    application: &CreditApplication,
    target: ApplicationStatus,
    actor: &Actor,
    rejection_reason: Option<&str>,
    time_provider: &SafeTimeProvider,
    events: &mut EventStore,
) -> Result<CreditApplication> {
    let updated = transition(application, target, actor, rejection_reason, time_provider)?;

    events.emit(Event::StatusChanged {
        application_id: updated.id,
        old_status: application.status,
        new_status: updated.status,
        actor_id: actor.id,
        reason: updated.rejection_reason.clone().filter(|_| target == ApplicationStatus::Rejected),
        timestamp: updated.updated_at,
    });

    Ok(updated)
}

/// claimed applications are decided by the claimer; admins may step in
fn ensure_owner(application: &CreditApplication, actor: &Actor, action: &str) -> Result<()> {
    if actor.is_admin() || application.reviewed_by == Some(actor.id) {
        return Ok(());
    }
    Err(unauthorized(
        actor,
        &format!("{} an application claimed by another institution", action),
    ))
}

fn unauthorized(actor: &Actor, action: &str) -> CreditError {
    CreditError::UnauthorizedActor {
        actor: actor.to_string(),
        action: action.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{clock, origin, pending_application};
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    use crate::types::ApplicationStatus::*;

    #[test]
    fn test_claim_records_reviewer() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());

        time.test_control().unwrap().advance(Duration::hours(2));
        let claimed = transition(&app, UnderReview, &bank, None, &time).unwrap();

        assert_eq!(claimed.status, UnderReview);
        assert_eq!(claimed.reviewed_by, Some(bank.id));
        assert_eq!(claimed.updated_at, origin() + Duration::hours(2));
        assert_eq!(claimed.created_at, app.created_at);
    }

    #[test]
    fn test_full_approval_path() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());

        let claimed = transition(&app, UnderReview, &bank, None, &time).unwrap();
        let approved = transition(&claimed, Approved, &bank, None, &time).unwrap();

        assert_eq!(approved.status, Approved);
        assert_eq!(approved.approved_by, Some(bank.id));
        assert_eq!(approved.reviewed_by, Some(bank.id));
        assert!(approved.rejection_reason.is_none());
    }

    #[test]
    fn test_reject_requires_reason() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());

        for reason in [None, Some(""), Some("   ")] {
            assert_eq!(
                transition(&app, Rejected, &bank, reason, &time),
                Err(CreditError::MissingRejectionReason)
            );
        }

        let rejected = transition(&app, Rejected, &bank, Some(" Garantias insuficientes "), &time).unwrap();
        assert_eq!(rejected.status, Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Garantias insuficientes"));
        assert_eq!(rejected.reviewed_by, Some(bank.id));
    }

    #[test]
    fn test_reject_after_review_keeps_claimer() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());
        let admin = Actor::admin(Uuid::new_v4());

        let claimed = transition(&app, UnderReview, &bank, None, &time).unwrap();
        let mut events = EventStore::new();
        let rejected =
            transition_recorded(&claimed, Rejected, &admin, Some("Projeto inviável"), &time, &mut events).unwrap();

        assert_eq!(rejected.reviewed_by, Some(bank.id));
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Projeto inviável"));

        // the deciding admin is kept on the audit event
        match events.events() {
            [Event::StatusChanged { actor_id, reason, .. }] => {
                assert_eq!(*actor_id, admin.id);
                assert_eq!(reason.as_deref(), Some("Projeto inviável"));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_terminal_states_never_move() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());
        let admin = Actor::admin(Uuid::new_v4());

        let claimed = transition(&app, UnderReview, &bank, None, &time).unwrap();
        let approved = transition(&claimed, Approved, &bank, None, &time).unwrap();
        let rejected = transition(&app, Rejected, &bank, Some("Sem garantias"), &time).unwrap();

        for terminal in [&approved, &rejected] {
            for target in [Pending, UnderReview, Approved, Rejected] {
                assert_eq!(
                    transition(terminal, target, &admin, Some("reabrir"), &time),
                    Err(CreditError::InvalidTransition {
                        from: terminal.status,
                        to: target,
                    })
                );
            }
        }
    }

    #[test]
    fn test_disallowed_pairs() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());

        assert!(matches!(
            transition(&app, Approved, &bank, None, &time),
            Err(CreditError::InvalidTransition { .. })
        ));
        assert!(matches!(
            transition(&app, Pending, &bank, None, &time),
            Err(CreditError::InvalidTransition { .. })
        ));

        let claimed = transition(&app, UnderReview, &bank, None, &time).unwrap();
        assert!(matches!(
            transition(&claimed, Pending, &bank, None, &time),
            Err(CreditError::InvalidTransition { .. })
        ));
        assert!(matches!(
            transition(&claimed, UnderReview, &bank, None, &time),
            Err(CreditError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_borrowers_cannot_review() {
        let time = clock();
        let app = pending_application(&time);
        let farmer = Actor::farmer(app.borrower_id);

        assert!(matches!(
            transition(&app, UnderReview, &farmer, None, &time),
            Err(CreditError::UnauthorizedActor { .. })
        ));
        assert!(matches!(
            transition(&app, Rejected, &farmer, Some("desisto"), &time),
            Err(CreditError::UnauthorizedActor { .. })
        ));
    }

    #[test]
    fn test_only_claimer_or_admin_decides() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());
        let rival = Actor::institution(Uuid::new_v4());
        let admin = Actor::admin(Uuid::new_v4());

        let claimed = transition(&app, UnderReview, &bank, None, &time).unwrap();

        assert!(matches!(
            transition(&claimed, Approved, &rival, None, &time),
            Err(CreditError::UnauthorizedActor { .. })
        ));
        assert!(matches!(
            transition(&claimed, Rejected, &rival, Some("não"), &time),
            Err(CreditError::UnauthorizedActor { .. })
        ));

        let approved = transition(&claimed, Approved, &admin, None, &time).unwrap();
        assert_eq!(approved.approved_by, Some(admin.id));
        assert_eq!(approved.reviewed_by, Some(bank.id));
    }

    #[test]
    fn test_profile_without_approve_grant() {
        let time = clock();
        let app = pending_application(&time);
        let analyst = Actor::with_permissions(
            Uuid::new_v4(),
            crate::types::UserType::FinancialInstitution,
            [Permission::ApplicationsRead],
        );

        let claimed = transition(&app, UnderReview, &analyst, None, &time).unwrap();
        assert!(matches!(
            transition(&claimed, Approved, &analyst, None, &time),
            Err(CreditError::UnauthorizedActor { .. })
        ));
    }

    #[test]
    fn test_failure_leaves_input_untouched() {
        let time = clock();
        let app = pending_application(&time);
        let before = app.clone();
        let bank = Actor::institution(Uuid::new_v4());

        let _ = transition(&app, Rejected, &bank, None, &time);
        let _ = transition(&app, Approved, &bank, None, &time);

        assert_eq!(app, before);
    }

    #[test]
    fn test_recorded_transition_emits_event() {
        let time = clock();
        let app = pending_application(&time);
        let bank = Actor::institution(Uuid::new_v4());
        let mut events = EventStore::new();

        let rejected =
            transition_recorded(&app, Rejected, &bank, Some("Documentação incompleta"), &time, &mut events)
                .unwrap();

        assert_eq!(
            events.events(),
            &[Event::StatusChanged {
                application_id: app.id,
                old_status: Pending,
                new_status: Rejected,
                actor_id: bank.id,
                reason: Some("Documentação incompleta".to_string()),
                timestamp: rejected.updated_at,
            }]
        );

        let failed = transition_recorded(&rejected, UnderReview, &bank, None, &time, &mut events);
        assert!(failed.is_err());
        assert_eq!(events.len(), 1);
    }
}
