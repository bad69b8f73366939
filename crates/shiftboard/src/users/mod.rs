//! Users, qualifications, and working time.

pub mod domain;
pub mod export;
pub mod qualifications;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    age_on, Qualification, QualificationCategory, QualificationGrant, QualificationId, UserId,
    UserProfile, WorkingHours,
};
pub use export::write_working_hours_csv;
pub use qualifications::QualificationCatalog;
pub use repository::UserRepository;
pub use router::user_router;
pub use service::{
    HeldQualification, UserService, UserServiceError, WorkingHoursItem, WorkingHoursSource,
    WorkingHoursSummary,
};
