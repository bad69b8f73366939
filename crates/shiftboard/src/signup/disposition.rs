//! Manager decisions on the participations of a shift.

use std::sync::PoisonError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use super::checks::ParticipationError;
use super::service::{SignupService, SignupServiceError};
use super::views::DispositionView;
use crate::events::domain::ShiftId;
use crate::events::participation::{
    ParticipantRef, Participation, ParticipationId, ParticipationState,
};
use crate::notifications::{NotificationDispatcher, NotificationKind};
use crate::repository::{RepositoryError, Store};
use crate::users::domain::UserId;

/// What a manager may decide about a pending participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Decline,
}

impl Decision {
    pub const fn target_state(self) -> ParticipationState {
        match self {
            Decision::Confirm => ParticipationState::Confirmed,
            Decision::Decline => ParticipationState::Declined,
        }
    }

    /// Decisions that would be accepted for a participation in `state`.
    pub fn allowed_from(state: ParticipationState) -> Vec<Decision> {
        [Decision::Confirm, Decision::Decline]
            .into_iter()
            .filter(|decision| state.can_transition_to(decision.target_state()))
            .collect()
    }

    fn notification(self) -> NotificationKind {
        match self {
            Decision::Confirm => NotificationKind::ParticipationConfirmed,
            Decision::Decline => NotificationKind::ParticipationRejected,
        }
    }
}

/// One entry of a disposition batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionDecision {
    pub participation_id: ParticipationId,
    pub decision: Decision,
}

impl<S, N> SignupService<S, N>
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn disposition_view(&self, shift_id: &ShiftId) -> Result<DispositionView, SignupServiceError> {
        let loaded = self.load_shift(shift_id)?;
        let catalog = self.catalog()?;
        let view = loaded.view(&loaded.participations, &catalog, None);
        loaded
            .method
            .disposition_view(&view)
            .ok_or(SignupServiceError::DispositionUnsupported(loaded.method.slug()))
    }

    /// Apply a batch of decisions. Either every decision is stored or none is.
    pub fn dispose(
        &self,
        shift_id: &ShiftId,
        decisions: Vec<DispositionDecision>,
        now: DateTime<Utc>,
    ) -> Result<DispositionView, SignupServiceError> {
        let lock = self.shift_lock(shift_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loaded = self.load_shift(shift_id)?;
        if !loaded.method.supports_disposition() {
            return Err(SignupServiceError::DispositionUnsupported(
                loaded.method.slug(),
            ));
        }

        let mut working = loaded.participations.clone();
        let mut changed: Vec<(usize, Decision)> = Vec::new();
        for entry in &decisions {
            let Some(index) = working
                .iter()
                .position(|participation| participation.id == entry.participation_id)
            else {
                return Err(self.missing_participation(shift_id, &entry.participation_id)?);
            };
            working[index].transition(entry.decision.target_state(), now)?;
            changed.push((index, entry.decision));
        }

        let (_, maximum) = loaded.method.participant_count_bounds(&loaded.config);
        let confirmed = working
            .iter()
            .filter(|participation| participation.state().counts_as_confirmed())
            .count() as u32;
        let confirms = changed
            .iter()
            .any(|(_, decision)| *decision == Decision::Confirm);
        if let Some(maximum) = maximum {
            if confirms && confirmed > maximum {
                return Err(SignupServiceError::Rejected(vec![
                    ParticipationError::ParticipantLimitReached,
                ]));
            }
        }

        self.store.update_participations(
            changed
                .iter()
                .map(|(index, _)| working[*index].clone())
                .collect(),
        )?;

        tracing::info!(
            shift = %shift_id,
            decisions = changed.len(),
            confirmed,
            "disposition applied"
        );

        for (index, decision) in &changed {
            let participation = &working[*index];
            let subject = match decision {
                Decision::Confirm => format!(
                    "Your participation in {} has been confirmed",
                    loaded.shift.display_label()
                ),
                Decision::Decline => format!(
                    "Your participation in {} has been rejected",
                    loaded.shift.display_label()
                ),
            };
            self.notify_participant(participation, decision.notification(), subject);
        }

        let catalog = self.catalog()?;
        let view = loaded.view(&working, &catalog, None);
        loaded
            .method
            .disposition_view(&view)
            .ok_or(SignupServiceError::DispositionUnsupported(loaded.method.slug()))
    }

    /// Put a user on the shift as confirmed, bypassing the signup checks.
    pub fn add_participant(
        &self,
        shift_id: &ShiftId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Participation, SignupServiceError> {
        let lock = self.shift_lock(shift_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loaded = self.load_shift(shift_id)?;
        if !loaded.method.supports_disposition() {
            return Err(SignupServiceError::DispositionUnsupported(
                loaded.method.slug(),
            ));
        }

        let user = self
            .store
            .user(user_id)?
            .ok_or_else(|| SignupServiceError::UnknownUser(user_id.clone()))?;
        let reference = ParticipantRef::Local(user.id.clone());
        if loaded.existing(&reference).is_some() {
            return Err(RepositoryError::Conflict.into());
        }

        let (_, maximum) = loaded.method.participant_count_bounds(&loaded.config);
        let confirmed = loaded
            .participations
            .iter()
            .filter(|participation| participation.state().counts_as_confirmed())
            .count() as u32;
        if maximum.is_some_and(|maximum| confirmed >= maximum) {
            return Err(SignupServiceError::Rejected(vec![
                ParticipationError::ParticipantLimitReached,
            ]));
        }

        let participation = self.store.insert_participation(Participation::new(
            shift_id.clone(),
            reference,
            user.full_name(),
            ParticipationState::Confirmed,
            Map::new(),
            now,
        ))?;

        tracing::info!(
            shift = %shift_id,
            participation = %participation.id,
            "participant added by disposition"
        );
        self.notify_participant(
            &participation,
            NotificationKind::ParticipationConfirmed,
            format!(
                "You have been added to {}",
                loaded.shift.display_label()
            ),
        );
        Ok(participation)
    }

    /// Distinguish an id from another shift from one that does not exist.
    fn missing_participation(
        &self,
        shift_id: &ShiftId,
        participation_id: &ParticipationId,
    ) -> Result<SignupServiceError, SignupServiceError> {
        Ok(match self.store.participation(participation_id)? {
            Some(_) => SignupServiceError::ParticipationMismatch {
                participation: participation_id.clone(),
                shift: shift_id.clone(),
            },
            None => SignupServiceError::UnknownParticipation(participation_id.clone()),
        })
    }
}
