//! Events, their shifts, and the participations attached to shifts.

pub mod domain;
pub mod participation;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;

pub use domain::{event_window, Event, EventId, EventType, EventTypeId, Shift, ShiftId};
pub use participation::{
    ParticipantRef, Participation, ParticipationId, ParticipationState, TransitionError,
};
pub use repository::{EventRepository, ParticipationRepository};
pub use router::event_router;
pub use service::{EventOverview, EventService, EventServiceError, EventSummary, ShiftOverview};
pub use stats::SignupStats;
