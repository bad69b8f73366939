use std::sync::Arc;

use serde_json::Map;

use super::common::*;
use crate::events::participation::{Participation, ParticipationId, ParticipationState};
use crate::notifications::{InMemoryNotifications, NotificationKind};
use crate::plugins::PluginRegistry;
use crate::repository::RepositoryError;
use crate::signup::checks::ParticipationError;
use crate::signup::disposition::{Decision, DispositionDecision};
use crate::signup::service::{SignupService, SignupServiceError};
use crate::users::domain::UserId;

fn decide(participation: &Participation, decision: Decision) -> DispositionDecision {
    DispositionDecision {
        participation_id: participation.id.clone(),
        decision,
    }
}

fn request(service: &TestService, shift: &str, participant: &str) -> Participation {
    service
        .perform_signup(&shift_id(shift), user(participant), Map::new(), now())
        .expect("request stored")
}

#[test]
fn view_lists_participations_with_allowed_decisions() {
    let (service, _, _) = build_service();
    let pending = request(&service, REQUEST, CAT);

    let view = service
        .disposition_view(&shift_id(REQUEST))
        .expect("request_confirm supports disposition");

    assert_eq!(view.event_title, "City marathon");
    assert_eq!(view.signup_method, "request_confirm");
    assert_eq!(view.stats.requested_count, 1);
    assert_eq!(view.participations.len(), 1);
    assert_eq!(view.participations[0].participation_id, pending.id);
    assert_eq!(
        view.participations[0].allowed_decisions,
        vec![Decision::Confirm, Decision::Decline]
    );
}

#[test]
fn confirming_notifies_the_participant() {
    let (service, store, notifications) = build_service();
    let pending = request(&service, REQUEST, CAT);

    let view = service
        .dispose(
            &shift_id(REQUEST),
            vec![decide(&pending, Decision::Confirm)],
            now(),
        )
        .expect("disposition applied");

    assert_eq!(state_of(&store, &pending.id), ParticipationState::Confirmed);
    assert_eq!(view.stats.confirmed_count, 1);
    assert!(view.participations[0].allowed_decisions.is_empty());
    let sent = notifications.of_kind(NotificationKind::ParticipationConfirmed);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["cat@example.org".to_string()]);
}

#[test]
fn declining_notifies_the_participant() {
    let (service, store, notifications) = build_service();
    let pending = request(&service, REQUEST, CAT);

    service
        .dispose(
            &shift_id(REQUEST),
            vec![decide(&pending, Decision::Decline)],
            now(),
        )
        .expect("disposition applied");

    assert_eq!(state_of(&store, &pending.id), ParticipationState::Declined);
    assert_eq!(
        notifications
            .of_kind(NotificationKind::ParticipationRejected)
            .len(),
        1
    );
}

#[test]
fn batch_exceeding_the_maximum_changes_nothing() {
    let (service, store, notifications) = build_service();
    let first = request(&service, REQUEST, CAT);
    let second = request(&service, REQUEST, EVE);

    let result = service.dispose(
        &shift_id(REQUEST),
        vec![
            decide(&first, Decision::Confirm),
            decide(&second, Decision::Confirm),
        ],
        now(),
    );

    match result {
        Err(SignupServiceError::Rejected(errors)) => {
            assert_eq!(errors, vec![ParticipationError::ParticipantLimitReached]);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(state_of(&store, &first.id), ParticipationState::Requested);
    assert_eq!(state_of(&store, &second.id), ParticipationState::Requested);
    assert!(notifications
        .of_kind(NotificationKind::ParticipationConfirmed)
        .is_empty());
}

#[test]
fn confirm_and_decline_in_one_batch_fits_the_maximum() {
    let (service, store, _) = build_service();
    let first = request(&service, REQUEST, CAT);
    let second = request(&service, REQUEST, EVE);

    service
        .dispose(
            &shift_id(REQUEST),
            vec![
                decide(&first, Decision::Confirm),
                decide(&second, Decision::Decline),
            ],
            now(),
        )
        .expect("one place taken");

    assert_eq!(state_of(&store, &first.id), ParticipationState::Confirmed);
    assert_eq!(state_of(&store, &second.id), ParticipationState::Declined);
}

#[test]
fn failed_store_write_leaves_the_whole_batch_undecided() {
    let seeded = seeded_store();
    let notifications = Arc::new(InMemoryNotifications::default());
    let service = SignupService::new(
        Arc::new(WriteLimitedStore::new(seeded.clone(), 1)),
        notifications.clone(),
        Arc::new(PluginRegistry::default()),
    );
    let first = service
        .perform_signup(&shift_id(REQUEST), user(CAT), Map::new(), now())
        .expect("request stored");
    let second = service
        .perform_signup(&shift_id(REQUEST), user(EVE), Map::new(), now())
        .expect("request stored");

    let result = service.dispose(
        &shift_id(REQUEST),
        vec![
            decide(&first, Decision::Confirm),
            decide(&second, Decision::Decline),
        ],
        now(),
    );

    assert!(matches!(
        result,
        Err(SignupServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert_eq!(state_of(&seeded, &first.id), ParticipationState::Requested);
    assert_eq!(state_of(&seeded, &second.id), ParticipationState::Requested);
    assert!(notifications.sent().is_empty());
}

#[test]
fn unknown_participation_aborts_the_batch() {
    let (service, store, _) = build_service();
    let pending = request(&service, REQUEST, CAT);

    let result = service.dispose(
        &shift_id(REQUEST),
        vec![
            decide(&pending, Decision::Confirm),
            DispositionDecision {
                participation_id: ParticipationId("ptc-999999".to_string()),
                decision: Decision::Decline,
            },
        ],
        now(),
    );

    assert!(matches!(
        result,
        Err(SignupServiceError::UnknownParticipation(_))
    ));
    assert_eq!(state_of(&store, &pending.id), ParticipationState::Requested);
}

#[test]
fn participation_of_another_shift_is_a_mismatch() {
    let (service, _, _) = build_service();
    let elsewhere = request(&service, MEDIC, ADA);

    let result = service.dispose(
        &shift_id(REQUEST),
        vec![decide(&elsewhere, Decision::Confirm)],
        now(),
    );

    assert!(matches!(
        result,
        Err(SignupServiceError::ParticipationMismatch { .. })
    ));
}

#[test]
fn decided_participations_cannot_be_decided_again() {
    let (service, _, _) = build_service();
    let pending = request(&service, REQUEST, CAT);
    service
        .dispose(
            &shift_id(REQUEST),
            vec![decide(&pending, Decision::Decline)],
            now(),
        )
        .expect("declined");

    let result = service.dispose(
        &shift_id(REQUEST),
        vec![decide(&pending, Decision::Confirm)],
        now(),
    );

    match result {
        Err(SignupServiceError::Transition(error)) => {
            assert_eq!(error.from, ParticipationState::Declined);
            assert_eq!(error.to, ParticipationState::Confirmed);
        }
        other => panic!("expected transition error, got {other:?}"),
    }
}

#[test]
fn add_participant_confirms_directly() {
    let (service, _, notifications) = build_service();

    let added = service
        .add_participant(&shift_id(NO_SELF_SERVICE), &UserId(ADA.to_string()), now())
        .expect("manager adds participant");

    assert_eq!(added.state(), ParticipationState::Confirmed);
    assert_eq!(added.participant, local(ADA));
    assert_eq!(
        notifications
            .of_kind(NotificationKind::ParticipationConfirmed)
            .len(),
        1
    );
}

#[test]
fn add_participant_rejects_duplicates_and_full_shifts() {
    let (service, _, _) = build_service();
    service
        .add_participant(&shift_id(NO_SELF_SERVICE), &UserId(ADA.to_string()), now())
        .expect("first place");

    assert!(matches!(
        service.add_participant(&shift_id(NO_SELF_SERVICE), &UserId(ADA.to_string()), now()),
        Err(SignupServiceError::Repository(RepositoryError::Conflict))
    ));
    match service.add_participant(&shift_id(NO_SELF_SERVICE), &UserId(CAT.to_string()), now()) {
        Err(SignupServiceError::Rejected(errors)) => {
            assert_eq!(errors, vec![ParticipationError::ParticipantLimitReached]);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn inactive_users_are_not_notified() {
    let (service, _, notifications) = build_service();

    service
        .add_participant(&shift_id(INSTANT), &UserId(DAN.to_string()), now())
        .expect("added");

    assert!(notifications.sent().is_empty());
}

#[test]
fn unknown_user_cannot_be_added() {
    let (service, _, _) = build_service();

    assert!(matches!(
        service.add_participant(&shift_id(INSTANT), &UserId("u-nobody".to_string()), now()),
        Err(SignupServiceError::UnknownUser(_))
    ));
}
