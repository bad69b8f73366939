//! Signup methods, their checks, and the participation workflow built on them.
//!
//! A shift names its signup method by slug. The method decides which checks run, whether an
//! accepted request is confirmed immediately, and how the shift is presented to participants
//! and to the responsibles doing the disposition.

pub mod checks;
pub mod configuration;
pub mod disposition;
pub mod method;
pub mod methods;
pub mod participant;
pub mod registry;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use checks::{ParticipationError, SignupCheck, SignupContext};
pub use configuration::{SignupConfiguration, SignupInfoEntry};
pub use disposition::{Decision, DispositionDecision};
pub use method::{Admission, SignupMethod, SignupMethodSummary};
pub use methods::{
    InstantConfirmationSignupMethod, NoSelfServiceSignupMethod, RequestConfirmSignupMethod,
};
pub use participant::{GuestRegistration, Participant, ParticipantRequest};
pub use registry::{RegistryError, SignupMethodRegistry};
pub use router::signup_router;
pub use service::{SignupService, SignupServiceError};
pub use views::{DispositionEntry, DispositionView, ShiftStateView, ShiftView};
