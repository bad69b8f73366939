use super::domain::{Event, EventId, EventType, EventTypeId, Shift, ShiftId};
use super::participation::{ParticipantRef, Participation, ParticipationId, ParticipationState};
use crate::repository::RepositoryError;

/// Storage abstraction for events, their types, and shifts.
pub trait EventRepository: Send + Sync {
    fn event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError>;
    fn events(&self) -> Result<Vec<Event>, RepositoryError>;
    fn update_event(&self, event: Event) -> Result<(), RepositoryError>;
    fn event_type(&self, id: &EventTypeId) -> Result<Option<EventType>, RepositoryError>;
    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError>;
    /// Shifts of the event ordered by meeting time, then start time.
    fn shifts_for_event(&self, event: &EventId) -> Result<Vec<Shift>, RepositoryError>;
}

/// Storage abstraction for participations.
///
/// Implementations must reject a second participation of the same participant on the same
/// shift with [`RepositoryError::Conflict`].
pub trait ParticipationRepository: Send + Sync {
    fn insert_participation(
        &self,
        participation: Participation,
    ) -> Result<Participation, RepositoryError>;
    fn update_participation(&self, participation: Participation) -> Result<(), RepositoryError>;
    /// Store every participation or none of them; fails with [`RepositoryError::NotFound`] if
    /// any is unknown.
    fn update_participations(
        &self,
        participations: Vec<Participation>,
    ) -> Result<(), RepositoryError>;
    fn participation(
        &self,
        id: &ParticipationId,
    ) -> Result<Option<Participation>, RepositoryError>;
    fn participations_for_shift(
        &self,
        shift: &ShiftId,
    ) -> Result<Vec<Participation>, RepositoryError>;
    fn participations_for_participant(
        &self,
        participant: &ParticipantRef,
    ) -> Result<Vec<Participation>, RepositoryError>;
    fn participations_in_state(
        &self,
        state: ParticipationState,
    ) -> Result<Vec<Participation>, RepositoryError>;
}
