use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::checks::{ParticipationError, SignupContext};
use super::configuration::SignupConfiguration;
use super::method::{SignupMethod, SignupMethodSummary};
use super::participant::{Participant, ParticipantRequest};
use super::registry::RegistryError;
use super::views::{ShiftStateView, ShiftView};
use crate::events::domain::{Event, EventId, Shift, ShiftId};
use crate::events::participation::{
    ParticipantRef, Participation, ParticipationId, ParticipationState, TransitionError,
};
use crate::notifications::{send_robust, Notification, NotificationDispatcher, NotificationKind};
use crate::plugins::{PluginRegistry, GUESTS_PLUGIN};
use crate::repository::{RepositoryError, Store};
use crate::users::domain::UserId;
use crate::users::qualifications::QualificationCatalog;

/// Service running signups, declines, and the disposition against a [`Store`].
pub struct SignupService<S, N> {
    pub(super) store: Arc<S>,
    pub(super) notifications: Arc<N>,
    pub(super) plugins: Arc<PluginRegistry>,
    shift_locks: Mutex<HashMap<ShiftId, Arc<Mutex<()>>>>,
}

/// Everything loaded for one shift.
pub(super) struct LoadedShift {
    pub shift: Shift,
    pub event: Event,
    pub config: SignupConfiguration,
    pub method: Arc<dyn SignupMethod>,
    pub participations: Vec<Participation>,
}

impl LoadedShift {
    pub fn view<'a>(
        &'a self,
        participations: &'a [Participation],
        catalog: &'a QualificationCatalog,
        viewer: Option<&'a ParticipantRef>,
    ) -> ShiftView<'a> {
        ShiftView {
            shift: &self.shift,
            event: &self.event,
            config: &self.config,
            participations,
            catalog,
            viewer,
        }
    }

    pub fn existing(&self, participant: &ParticipantRef) -> Option<&Participation> {
        self.participations
            .iter()
            .find(|participation| &participation.participant == participant)
    }
}

impl<S, N> SignupService<S, N>
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            store,
            notifications,
            plugins,
            shift_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Methods new shifts may use.
    pub fn signup_methods(&self) -> Vec<SignupMethodSummary> {
        self.plugins
            .enabled_signup_methods()
            .methods()
            .iter()
            .map(|method| SignupMethodSummary::of(method.as_ref()))
            .collect()
    }

    /// Sign the participant up. Admission decides between `requested` and `confirmed`.
    pub fn perform_signup(
        &self,
        shift_id: &ShiftId,
        request: ParticipantRequest,
        data: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Participation, SignupServiceError> {
        let participant = self.resolve_participant(request, now)?;

        let lock = self.shift_lock(shift_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loaded = self.load_shift(shift_id)?;
        let catalog = self.catalog()?;
        let confirmed_elsewhere = self.confirmed_shifts_of(&participant.reference, shift_id)?;
        let ctx = SignupContext {
            shift: &loaded.shift,
            event: &loaded.event,
            config: &loaded.config,
            participant: &participant,
            existing: loaded.existing(&participant.reference),
            shift_participations: &loaded.participations,
            confirmed_elsewhere: &confirmed_elsewhere,
            catalog: &catalog,
            now,
        };

        let errors = loaded.method.signup_errors(&ctx);
        if !errors.is_empty() {
            tracing::info!(
                shift = %shift_id,
                participant = %participant.reference,
                reasons = errors.len(),
                "signup rejected"
            );
            return Err(SignupServiceError::Rejected(errors));
        }

        let state = loaded.method.admission(&ctx).state();
        let participation = self.store.insert_participation(Participation::new(
            shift_id.clone(),
            participant.reference.clone(),
            participant.display_name(),
            state,
            data,
            now,
        ))?;

        tracing::info!(
            shift = %shift_id,
            participation = %participation.id,
            method = loaded.method.slug(),
            state = state.label(),
            "participant signed up"
        );

        send_robust(
            self.notifications.as_ref(),
            Notification::new(
                NotificationKind::ResponsibleParticipationRequested,
                format!(
                    "{} signed up for {}",
                    participation.display_name, loaded.event.title
                ),
            )
            .to(loaded.event.responsibles.iter().cloned())
            .detail("shift_id", shift_id.0.clone())
            .detail("participation_id", participation.id.0.clone())
            .detail("state", state.label()),
        );

        Ok(participation)
    }

    /// Withdraw a pending request, or record up front that the participant will not come.
    pub fn perform_decline(
        &self,
        shift_id: &ShiftId,
        request: ParticipantRequest,
        now: DateTime<Utc>,
    ) -> Result<Participation, SignupServiceError> {
        let participant = self.resolve_participant(request, now)?;

        let lock = self.shift_lock(shift_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let loaded = self.load_shift(shift_id)?;
        let catalog = self.catalog()?;
        let existing = loaded.existing(&participant.reference);
        let ctx = SignupContext {
            shift: &loaded.shift,
            event: &loaded.event,
            config: &loaded.config,
            participant: &participant,
            existing,
            shift_participations: &loaded.participations,
            confirmed_elsewhere: &[],
            catalog: &catalog,
            now,
        };

        let errors = loaded.method.decline_errors(&ctx);
        if !errors.is_empty() {
            return Err(SignupServiceError::Rejected(errors));
        }

        let participation = match existing {
            Some(current) => {
                let mut updated = current.clone();
                updated.transition(ParticipationState::Declined, now)?;
                self.store.update_participation(updated.clone())?;
                updated
            }
            None => self.store.insert_participation(Participation::new(
                shift_id.clone(),
                participant.reference.clone(),
                participant.display_name(),
                ParticipationState::Declined,
                Map::new(),
                now,
            ))?,
        };

        tracing::info!(
            shift = %shift_id,
            participation = %participation.id,
            "participant declined"
        );
        Ok(participation)
    }

    /// Participant-facing status of the shift, rendered by its signup method.
    pub fn shift_state(
        &self,
        shift_id: &ShiftId,
        viewer: Option<&ParticipantRef>,
    ) -> Result<ShiftStateView, SignupServiceError> {
        let loaded = self.load_shift(shift_id)?;
        let catalog = self.catalog()?;
        let view = loaded.view(&loaded.participations, &catalog, viewer);
        Ok(loaded.method.render_shift_state(&view))
    }

    /// Move every confirmed participation whose shift ended before `now` to `finished`.
    pub fn finish_elapsed(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Participation>, SignupServiceError> {
        let mut by_shift: HashMap<ShiftId, Vec<Participation>> = HashMap::new();
        for participation in self
            .store
            .participations_in_state(ParticipationState::Confirmed)?
        {
            by_shift
                .entry(participation.shift.clone())
                .or_default()
                .push(participation);
        }

        let mut finished = Vec::new();
        for (shift_id, participations) in by_shift {
            let Some(shift) = self.store.shift(&shift_id)? else {
                tracing::warn!(shift = %shift_id, "confirmed participations reference a missing shift");
                continue;
            };
            if !shift.has_ended(now) {
                continue;
            }

            let lock = self.shift_lock(&shift_id);
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut done = Vec::with_capacity(participations.len());
            for mut participation in participations {
                participation.transition(ParticipationState::Finished, now)?;
                done.push(participation);
            }
            self.store.update_participations(done.clone())?;
            for participation in done {
                self.notify_participant(
                    &participation,
                    NotificationKind::ParticipationFinished,
                    format!("Thank you for your participation in {}", shift.display_label()),
                );
                finished.push(participation);
            }
        }

        if !finished.is_empty() {
            tracing::info!(count = finished.len(), "finished elapsed participations");
        }
        Ok(finished)
    }

    /// Lock serializing writes to one shift. Entries nobody holds are dropped on the way, so
    /// the map only tracks shifts currently being written.
    pub(super) fn shift_lock(&self, shift: &ShiftId) -> Arc<Mutex<()>> {
        let mut locks = self
            .shift_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(shift.clone()).or_default())
    }

    #[cfg(test)]
    pub(super) fn tracked_shift_locks(&self) -> usize {
        self.shift_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(super) fn load_shift(&self, shift_id: &ShiftId) -> Result<LoadedShift, SignupServiceError> {
        let shift = self
            .store
            .shift(shift_id)?
            .ok_or_else(|| SignupServiceError::UnknownShift(shift_id.clone()))?;
        let event = self
            .store
            .event(&shift.event)?
            .ok_or_else(|| SignupServiceError::UnknownEvent(shift.event.clone()))?;
        let config = SignupConfiguration::from_value(&shift.signup_configuration)?;
        let method = self.plugins.signup_method(&shift.signup_method_slug)?;
        let participations = self.store.participations_for_shift(shift_id)?;
        Ok(LoadedShift {
            shift,
            event,
            config,
            method,
            participations,
        })
    }

    pub(super) fn catalog(&self) -> Result<QualificationCatalog, SignupServiceError> {
        Ok(QualificationCatalog::new(self.store.qualifications()?))
    }

    fn resolve_participant(
        &self,
        request: ParticipantRequest,
        now: DateTime<Utc>,
    ) -> Result<Participant, SignupServiceError> {
        match request {
            ParticipantRequest::UserId(user_id) => {
                let user = self
                    .store
                    .user(&user_id)?
                    .ok_or(SignupServiceError::UnknownUser(user_id))?;
                let grants = self.store.grants_for_user(&user.id)?;
                Ok(user.as_participant(&grants, now))
            }
            ParticipantRequest::Guest(registration) => {
                if !self.plugins.is_enabled(GUESTS_PLUGIN) {
                    return Err(SignupServiceError::GuestsDisabled);
                }
                Ok(registration.into_participant())
            }
        }
    }

    /// Shifts, other than `except`, the participant holds a confirmed place on.
    fn confirmed_shifts_of(
        &self,
        participant: &ParticipantRef,
        except: &ShiftId,
    ) -> Result<Vec<Shift>, SignupServiceError> {
        let mut shifts = Vec::new();
        for participation in self.store.participations_for_participant(participant)? {
            if participation.state() != ParticipationState::Confirmed
                || &participation.shift == except
            {
                continue;
            }
            if let Some(shift) = self.store.shift(&participation.shift)? {
                shifts.push(shift);
            }
        }
        Ok(shifts)
    }

    /// Address a participation's owner, if they can be reached.
    pub(super) fn notify_participant(
        &self,
        participation: &Participation,
        kind: NotificationKind,
        subject: String,
    ) {
        let recipient = match &participation.participant {
            ParticipantRef::Guest { email } => Some(email.clone()),
            ParticipantRef::Local(user_id) => match self.store.user(user_id) {
                Ok(user) => user
                    .filter(|user| user.is_active)
                    .map(|user| user.email),
                Err(err) => {
                    tracing::warn!(user = %user_id, error = %err, "recipient lookup failed");
                    None
                }
            },
        };

        send_robust(
            self.notifications.as_ref(),
            Notification::new(kind, subject)
                .to(recipient)
                .detail("participation_id", participation.id.0.clone())
                .detail("shift_id", participation.shift.0.clone()),
        );
    }
}

fn summarize(errors: &[ParticipationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error raised by the signup service.
#[derive(Debug, thiserror::Error)]
pub enum SignupServiceError {
    #[error("participation rejected: {}", summarize(.0))]
    Rejected(Vec<ParticipationError>),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid signup configuration: {0}")]
    Configuration(#[from] serde_json::Error),
    #[error("shift '{0}' was not found")]
    UnknownShift(ShiftId),
    #[error("event '{0}' was not found")]
    UnknownEvent(EventId),
    #[error("user '{0}' was not found")]
    UnknownUser(UserId),
    #[error("participation '{0}' was not found")]
    UnknownParticipation(ParticipationId),
    #[error("participation '{participation}' does not belong to shift '{shift}'")]
    ParticipationMismatch {
        participation: ParticipationId,
        shift: ShiftId,
    },
    #[error("signup method '{0}' does not support disposition")]
    DispositionUnsupported(&'static str),
    #[error("guest signups are disabled")]
    GuestsDisabled,
}
