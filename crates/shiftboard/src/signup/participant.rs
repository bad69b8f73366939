use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::events::participation::ParticipantRef;
use crate::users::domain::{age_on, QualificationGrant, QualificationId, UserId, UserProfile};

/// Snapshot of whoever is signing up, independent of how they are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub reference: ParticipantRef,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    /// `None` suppresses notifications.
    pub email: Option<String>,
    pub qualifications: BTreeSet<QualificationId>,
}

impl Participant {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn age_on(&self, day: NaiveDate) -> u32 {
        age_on(self.date_of_birth, day)
    }
}

impl UserProfile {
    /// Participant view of the user with every grant still valid at `now`.
    pub fn as_participant(&self, grants: &[QualificationGrant], now: DateTime<Utc>) -> Participant {
        let qualifications = grants
            .iter()
            .filter(|grant| grant.user == self.id && !grant.is_expired_at(now))
            .map(|grant| grant.qualification.clone())
            .collect();

        Participant {
            reference: ParticipantRef::Local(self.id.clone()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            email: self.is_active.then(|| self.email.clone()),
            qualifications,
        }
    }
}

/// Details a guest hands in when signing up without an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRegistration {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
}

impl GuestRegistration {
    pub fn into_participant(self) -> Participant {
        let email = self.email.trim().to_string();
        Participant {
            reference: ParticipantRef::Guest {
                email: email.to_ascii_lowercase(),
            },
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            email: Some(email),
            qualifications: BTreeSet::new(),
        }
    }
}

/// How a request names its participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRequest {
    UserId(UserId),
    Guest(GuestRegistration),
}
