//! Storage seams shared by the services.
//!
//! Each model module declares its own repository trait; [`Store`] bundles them so a single
//! backend can be handed to the services.

use crate::events::repository::{EventRepository, ParticipationRepository};
use crate::users::repository::UserRepository;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Every repository the services need, implemented by one backend.
pub trait Store: EventRepository + ParticipationRepository + UserRepository {}

impl<T> Store for T where T: EventRepository + ParticipationRepository + UserRepository {}
