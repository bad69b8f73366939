use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::ShiftId;
use crate::users::domain::UserId;

/// Identifier wrapper for participations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipationId(pub String);

impl fmt::Display for ParticipationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static PARTICIPATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_participation_id() -> ParticipationId {
    let id = PARTICIPATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ParticipationId(format!("ptc-{id:06}"))
}

/// Who a participation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRef {
    Local(UserId),
    Guest { email: String },
}

impl ParticipantRef {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            ParticipantRef::Local(user) => Some(user),
            ParticipantRef::Guest { .. } => None,
        }
    }
}

impl fmt::Display for ParticipantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRef::Local(user) => write!(f, "{user}"),
            ParticipantRef::Guest { email } => write!(f, "guest:{email}"),
        }
    }
}

/// Lifecycle of a participation.
///
/// `Requested -> Confirmed | Declined`, `Confirmed -> Finished`. Nothing else moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationState {
    Requested,
    Confirmed,
    Declined,
    Finished,
}

impl ParticipationState {
    pub const fn label(self) -> &'static str {
        match self {
            ParticipationState::Requested => "requested",
            ParticipationState::Confirmed => "confirmed",
            ParticipationState::Declined => "declined",
            ParticipationState::Finished => "finished",
        }
    }

    pub const fn can_transition_to(self, next: ParticipationState) -> bool {
        matches!(
            (self, next),
            (ParticipationState::Requested, ParticipationState::Confirmed)
                | (ParticipationState::Requested, ParticipationState::Declined)
                | (ParticipationState::Confirmed, ParticipationState::Finished)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            ParticipationState::Declined | ParticipationState::Finished
        )
    }

    /// Whether the participant occupies a place on the shift.
    pub const fn counts_as_confirmed(self) -> bool {
        matches!(
            self,
            ParticipationState::Confirmed | ParticipationState::Finished
        )
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("participation cannot move from {} to {}", .from.label(), .to.label())]
pub struct TransitionError {
    pub from: ParticipationState,
    pub to: ParticipationState,
}

/// A participant's relation to a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: ParticipationId,
    pub shift: ShiftId,
    pub participant: ParticipantRef,
    pub display_name: String,
    state: ParticipationState,
    /// Signup-method specific payload, stored as handed in.
    #[serde(default)]
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participation {
    pub(crate) fn new(
        shift: ShiftId,
        participant: ParticipantRef,
        display_name: String,
        state: ParticipationState,
        data: Map<String, Value>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: next_participation_id(),
            shift,
            participant,
            display_name,
            state,
            data,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn state(&self) -> ParticipationState {
        self.state
    }

    pub(crate) fn transition(
        &mut self,
        next: ParticipationState,
        at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(next) {
            return Err(TransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = at;
        Ok(())
    }
}
