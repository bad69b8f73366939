use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{QualificationId, UserId, UserProfile};
use super::qualifications::QualificationCatalog;
use crate::events::participation::ParticipantRef;
use crate::repository::{RepositoryError, Store};

/// Where a line of working time comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingHoursSource {
    Participation,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingHoursItem {
    pub date: NaiveDate,
    pub hours: f64,
    pub reason: String,
    pub source: WorkingHoursSource,
}

/// Working time of a user: confirmed or finished shifts plus manually recorded hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingHoursSummary {
    pub user: UserId,
    pub name: String,
    pub total_hours: f64,
    pub items: Vec<WorkingHoursItem>,
}

/// A held qualification as presented on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeldQualification {
    pub id: QualificationId,
    pub title: String,
    pub abbreviation: String,
    pub expires: Option<DateTime<Utc>>,
}

pub struct UserService<S> {
    store: Arc<S>,
}

impl<S> UserService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn working_hours(&self, user_id: &UserId) -> Result<WorkingHoursSummary, UserServiceError> {
        let user = self.profile(user_id)?;
        let mut items = Vec::new();

        let participant = ParticipantRef::Local(user.id.clone());
        for participation in self.store.participations_for_participant(&participant)? {
            if !participation.state().counts_as_confirmed() {
                continue;
            }
            let Some(shift) = self.store.shift(&participation.shift)? else {
                continue;
            };
            let reason = match self.store.event(&shift.event)? {
                Some(event) => event.title,
                None => shift.event.0.clone(),
            };
            items.push(WorkingHoursItem {
                date: shift.start_time.date_naive(),
                hours: shift.duration_hours(),
                reason,
                source: WorkingHoursSource::Participation,
            });
        }

        items.extend(
            self.store
                .working_hours_for_user(&user.id)?
                .into_iter()
                .map(|entry| WorkingHoursItem {
                    date: entry.date,
                    hours: entry.hours,
                    reason: entry.reason,
                    source: WorkingHoursSource::Manual,
                }),
        );
        items.sort_by(|left, right| left.date.cmp(&right.date));

        let total_hours: f64 = items.iter().map(|item| item.hours).sum();
        Ok(WorkingHoursSummary {
            user: user.id.clone(),
            name: user.full_name(),
            total_hours,
            items,
        })
    }

    /// Unexpired qualifications, leaving out those implied by another held one.
    pub fn qualifications(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<HeldQualification>, UserServiceError> {
        let user = self.profile(user_id)?;
        let catalog = QualificationCatalog::new(self.store.qualifications()?);
        let grants: Vec<_> = self
            .store
            .grants_for_user(&user.id)?
            .into_iter()
            .filter(|grant| !grant.is_expired_at(now))
            .collect();

        let held: BTreeSet<QualificationId> = grants
            .iter()
            .map(|grant| grant.qualification.clone())
            .collect();
        let essential = catalog.essential_set(&held);

        Ok(grants
            .into_iter()
            .filter(|grant| essential.contains(&grant.qualification))
            .map(|grant| {
                let (title, abbreviation) = match catalog.get(&grant.qualification) {
                    Some(qualification) => (
                        qualification.title.clone(),
                        qualification.abbreviation.clone(),
                    ),
                    None => (grant.qualification.0.clone(), String::new()),
                };
                HeldQualification {
                    id: grant.qualification,
                    title,
                    abbreviation,
                    expires: grant.expires,
                }
            })
            .collect())
    }

    fn profile(&self, user_id: &UserId) -> Result<UserProfile, UserServiceError> {
        self.store
            .user(user_id)?
            .ok_or_else(|| UserServiceError::UnknownUser(user_id.clone()))
    }
}

/// Error raised by the user service.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("user '{0}' was not found")]
    UnknownUser(UserId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
