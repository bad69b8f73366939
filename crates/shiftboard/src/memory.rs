//! Process-local [`Store`](crate::repository::Store) backend.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::events::domain::{Event, EventId, EventType, EventTypeId, Shift, ShiftId};
use crate::events::participation::{
    ParticipantRef, Participation, ParticipationId, ParticipationState,
};
use crate::events::repository::{EventRepository, ParticipationRepository};
use crate::repository::RepositoryError;
use crate::users::domain::{Qualification, QualificationGrant, UserId, UserProfile, WorkingHours};
use crate::users::repository::UserRepository;

#[derive(Debug, Default)]
struct Tables {
    event_types: BTreeMap<EventTypeId, EventType>,
    events: BTreeMap<EventId, Event>,
    shifts: BTreeMap<ShiftId, Shift>,
    participations: BTreeMap<ParticipationId, Participation>,
    users: BTreeMap<UserId, UserProfile>,
    qualifications: Vec<Qualification>,
    grants: Vec<QualificationGrant>,
    working_hours: Vec<WorkingHours>,
}

/// Every table behind one mutex.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn add_event_type(&self, event_type: EventType) -> Result<(), RepositoryError> {
        self.tables()?
            .event_types
            .insert(event_type.id.clone(), event_type);
        Ok(())
    }

    pub fn add_event(&self, event: Event) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.events.contains_key(&event.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.events.insert(event.id.clone(), event);
        Ok(())
    }

    pub fn add_shift(&self, shift: Shift) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.events.contains_key(&shift.event) {
            return Err(RepositoryError::NotFound);
        }
        if tables.shifts.contains_key(&shift.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.shifts.insert(shift.id.clone(), shift);
        Ok(())
    }

    pub fn add_user(&self, user: UserProfile) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.users.insert(user.id.clone(), user);
        Ok(())
    }

    pub fn add_qualification(&self, qualification: Qualification) -> Result<(), RepositoryError> {
        self.tables()?.qualifications.push(qualification);
        Ok(())
    }

    pub fn grant(&self, grant: QualificationGrant) -> Result<(), RepositoryError> {
        self.tables()?.grants.push(grant);
        Ok(())
    }

    pub fn add_working_hours(&self, entry: WorkingHours) -> Result<(), RepositoryError> {
        self.tables()?.working_hours.push(entry);
        Ok(())
    }
}

impl EventRepository for InMemoryStore {
    fn event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        Ok(self.tables()?.events.get(id).cloned())
    }

    fn events(&self) -> Result<Vec<Event>, RepositoryError> {
        Ok(self.tables()?.events.values().cloned().collect())
    }

    fn update_event(&self, event: Event) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.events.get_mut(&event.id) {
            Some(slot) => {
                *slot = event;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn event_type(&self, id: &EventTypeId) -> Result<Option<EventType>, RepositoryError> {
        Ok(self.tables()?.event_types.get(id).cloned())
    }

    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        Ok(self.tables()?.shifts.get(id).cloned())
    }

    fn shifts_for_event(&self, event: &EventId) -> Result<Vec<Shift>, RepositoryError> {
        let mut shifts: Vec<Shift> = self
            .tables()?
            .shifts
            .values()
            .filter(|shift| &shift.event == event)
            .cloned()
            .collect();
        shifts.sort_by_key(|shift| (shift.meeting_time, shift.start_time));
        Ok(shifts)
    }
}

impl ParticipationRepository for InMemoryStore {
    fn insert_participation(
        &self,
        participation: Participation,
    ) -> Result<Participation, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.participations.values().any(|existing| {
            existing.shift == participation.shift
                && existing.participant == participation.participant
        });
        if duplicate || tables.participations.contains_key(&participation.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .participations
            .insert(participation.id.clone(), participation.clone());
        Ok(participation)
    }

    fn update_participation(&self, participation: Participation) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.participations.get_mut(&participation.id) {
            Some(slot) => {
                *slot = participation;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn update_participations(
        &self,
        participations: Vec<Participation>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if participations
            .iter()
            .any(|participation| !tables.participations.contains_key(&participation.id))
        {
            return Err(RepositoryError::NotFound);
        }
        for participation in participations {
            tables
                .participations
                .insert(participation.id.clone(), participation);
        }
        Ok(())
    }

    fn participation(
        &self,
        id: &ParticipationId,
    ) -> Result<Option<Participation>, RepositoryError> {
        Ok(self.tables()?.participations.get(id).cloned())
    }

    fn participations_for_shift(
        &self,
        shift: &ShiftId,
    ) -> Result<Vec<Participation>, RepositoryError> {
        Ok(self
            .tables()?
            .participations
            .values()
            .filter(|participation| &participation.shift == shift)
            .cloned()
            .collect())
    }

    fn participations_for_participant(
        &self,
        participant: &ParticipantRef,
    ) -> Result<Vec<Participation>, RepositoryError> {
        Ok(self
            .tables()?
            .participations
            .values()
            .filter(|participation| &participation.participant == participant)
            .cloned()
            .collect())
    }

    fn participations_in_state(
        &self,
        state: ParticipationState,
    ) -> Result<Vec<Participation>, RepositoryError> {
        Ok(self
            .tables()?
            .participations
            .values()
            .filter(|participation| participation.state() == state)
            .cloned()
            .collect())
    }
}

impl UserRepository for InMemoryStore {
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    fn users(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        Ok(self.tables()?.users.values().cloned().collect())
    }

    fn qualifications(&self) -> Result<Vec<Qualification>, RepositoryError> {
        Ok(self.tables()?.qualifications.clone())
    }

    fn grants_for_user(&self, user: &UserId) -> Result<Vec<QualificationGrant>, RepositoryError> {
        Ok(self
            .tables()?
            .grants
            .iter()
            .filter(|grant| &grant.user == user)
            .cloned()
            .collect())
    }

    fn working_hours_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<WorkingHours>, RepositoryError> {
        Ok(self
            .tables()?
            .working_hours
            .iter()
            .filter(|entry| &entry.user == user)
            .cloned()
            .collect())
    }
}
