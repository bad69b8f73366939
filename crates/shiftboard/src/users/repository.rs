use super::domain::{Qualification, QualificationGrant, UserId, UserProfile, WorkingHours};
use crate::repository::RepositoryError;

/// Storage abstraction for users and everything hanging off a user profile.
pub trait UserRepository: Send + Sync {
    fn user(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
    fn users(&self) -> Result<Vec<UserProfile>, RepositoryError>;
    fn qualifications(&self) -> Result<Vec<Qualification>, RepositoryError>;
    fn grants_for_user(&self, user: &UserId) -> Result<Vec<QualificationGrant>, RepositoryError>;
    fn working_hours_for_user(&self, user: &UserId)
        -> Result<Vec<WorkingHours>, RepositoryError>;
}
