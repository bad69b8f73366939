use chrono::{DateTime, Utc};
use serde::Serialize;

use super::configuration::SignupConfiguration;
use super::participant::Participant;
use crate::events::domain::{Event, Shift, ShiftId};
use crate::events::participation::{Participation, ParticipationState};
use crate::users::qualifications::QualificationCatalog;

/// Reasons a signup or decline is refused. Checks collect every applicable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ParticipationError {
    #[error("the event is not active")]
    EventInactive,
    #[error("participation has already been requested")]
    AlreadyRequested,
    #[error("participant is already signed up")]
    AlreadyConfirmed,
    #[error("participation has already been declined")]
    AlreadyDeclined,
    #[error("participation is already finished")]
    AlreadyFinished,
    #[error("participant is bindingly signed up")]
    BindinglySignedUp,
    #[error("the signup period is over")]
    SignupClosed,
    #[error("participant is too young, the minimum age is {minimum_age}")]
    TooYoung { minimum_age: u32 },
    #[error("participant is already confirmed for overlapping shift {shift}")]
    ConflictingShift { shift: ShiftId },
    #[error("participant lacks a required qualification")]
    NotQualified,
    #[error("the maximum number of participants is reached")]
    ParticipantLimitReached,
    #[error("participants cannot sign up for this shift themselves")]
    SelfServiceDisabled,
}

/// Everything a check may look at, loaded once per signup attempt.
pub struct SignupContext<'a> {
    pub shift: &'a Shift,
    pub event: &'a Event,
    pub config: &'a SignupConfiguration,
    pub participant: &'a Participant,
    /// The participant's current participation on this shift.
    pub existing: Option<&'a Participation>,
    pub shift_participations: &'a [Participation],
    /// Other shifts the participant holds a confirmed place on.
    pub confirmed_elsewhere: &'a [Shift],
    pub catalog: &'a QualificationCatalog,
    pub now: DateTime<Utc>,
}

impl SignupContext<'_> {
    pub fn confirmed_count(&self) -> u32 {
        self.shift_participations
            .iter()
            .filter(|participation| participation.state().counts_as_confirmed())
            .count() as u32
    }
}

pub type SignupCheck = fn(&SignupContext<'_>) -> Option<ParticipationError>;

/// Run `checks` in order and keep every failure.
pub fn collect_errors(checks: &[SignupCheck], ctx: &SignupContext<'_>) -> Vec<ParticipationError> {
    checks.iter().filter_map(|check| check(ctx)).collect()
}

pub fn check_event_is_active(ctx: &SignupContext<'_>) -> Option<ParticipationError> {
    (!ctx.event.active).then_some(ParticipationError::EventInactive)
}

pub fn check_participation_state_for_signup(
    ctx: &SignupContext<'_>,
) -> Option<ParticipationError> {
    match ctx.existing?.state() {
        ParticipationState::Requested => Some(ParticipationError::AlreadyRequested),
        ParticipationState::Confirmed => Some(ParticipationError::AlreadyConfirmed),
        ParticipationState::Declined => Some(ParticipationError::AlreadyDeclined),
        ParticipationState::Finished => Some(ParticipationError::AlreadyFinished),
    }
}

pub fn check_participation_state_for_decline(
    ctx: &SignupContext<'_>,
) -> Option<ParticipationError> {
    match ctx.existing?.state() {
        ParticipationState::Requested => None,
        ParticipationState::Confirmed => Some(ParticipationError::BindinglySignedUp),
        ParticipationState::Declined => Some(ParticipationError::AlreadyDeclined),
        ParticipationState::Finished => Some(ParticipationError::AlreadyFinished),
    }
}

pub fn check_inside_signup_timeframe(ctx: &SignupContext<'_>) -> Option<ParticipationError> {
    let deadline = ctx.config.signup_deadline(ctx.shift.end_time);
    (ctx.now > deadline).then_some(ParticipationError::SignupClosed)
}

pub fn check_participant_age(ctx: &SignupContext<'_>) -> Option<ParticipationError> {
    let minimum_age = ctx.config.minimum_age?;
    let day = ctx.shift.start_time.date_naive();
    (ctx.participant.age_on(day) < minimum_age)
        .then_some(ParticipationError::TooYoung { minimum_age })
}

pub fn check_conflicting_shifts(ctx: &SignupContext<'_>) -> Option<ParticipationError> {
    ctx.confirmed_elsewhere
        .iter()
        .find(|other| other.id != ctx.shift.id && other.overlaps(ctx.shift))
        .map(|other| ParticipationError::ConflictingShift {
            shift: other.id.clone(),
        })
}

pub fn check_qualification(ctx: &SignupContext<'_>) -> Option<ParticipationError> {
    let qualified = ctx.catalog.has_qualifications(
        &ctx.participant.qualifications,
        &ctx.config.required_qualification_ids,
    );
    (!qualified).then_some(ParticipationError::NotQualified)
}

pub fn check_maximum_number_of_participants(
    ctx: &SignupContext<'_>,
) -> Option<ParticipationError> {
    let maximum = ctx.config.maximum_number_of_participants?;
    (ctx.confirmed_count() >= maximum).then_some(ParticipationError::ParticipantLimitReached)
}

pub fn default_signup_checks() -> Vec<SignupCheck> {
    vec![
        check_event_is_active,
        check_participation_state_for_signup,
        check_inside_signup_timeframe,
        check_participant_age,
        check_conflicting_shifts,
    ]
}

pub fn default_decline_checks() -> Vec<SignupCheck> {
    vec![
        check_event_is_active,
        check_participation_state_for_decline,
        check_inside_signup_timeframe,
    ]
}
