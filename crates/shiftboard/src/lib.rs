//! Volunteer shift scheduling: events and shifts, pluggable signup methods, the participation
//! state machine with its disposition, and working-hour accounting.

pub mod config;
pub mod error;
pub mod events;
pub mod memory;
pub mod notifications;
pub mod plugins;
pub mod repository;
pub mod signup;
pub mod telemetry;
pub mod users;

pub use memory::InMemoryStore;
pub use repository::{RepositoryError, Store};
