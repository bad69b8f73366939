use crate::config::ConfigError;
use crate::events::EventServiceError;
use crate::repository::RepositoryError;
use crate::signup::SignupServiceError;
use crate::telemetry::TelemetryError;
use crate::users::UserServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Process-level failure of the binary: startup, demo runs, and exports.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Repository(RepositoryError),
    Events(EventServiceError),
    Signup(SignupServiceError),
    Users(UserServiceError),
    Export(csv::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Repository(err) => write!(f, "repository error: {}", err),
            AppError::Events(err) => write!(f, "event error: {}", err),
            AppError::Signup(err) => write!(f, "signup error: {}", err),
            AppError::Users(err) => write!(f, "user error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Events(err) => Some(err),
            AppError::Signup(err) => Some(err),
            AppError::Users(err) => Some(err),
            AppError::Export(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Signup(SignupServiceError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Events(EventServiceError::UnknownEvent(_)) => StatusCode::NOT_FOUND,
            AppError::Signup(_) | AppError::Users(_) | AppError::Events(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Repository(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl From<EventServiceError> for AppError {
    fn from(value: EventServiceError) -> Self {
        Self::Events(value)
    }
}

impl From<SignupServiceError> for AppError {
    fn from(value: SignupServiceError) -> Self {
        Self::Signup(value)
    }
}

impl From<UserServiceError> for AppError {
    fn from(value: UserServiceError) -> Self {
        Self::Users(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventId;
    use crate::signup::ParticipationError;

    #[test]
    fn rejected_signup_maps_to_unprocessable() {
        let error = AppError::from(SignupServiceError::Rejected(vec![
            ParticipationError::SignupClosed,
        ]));
        assert_eq!(error.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn unknown_event_maps_to_not_found() {
        let error = AppError::from(EventServiceError::UnknownEvent(EventId("evt-x".to_string())));
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn repository_failure_maps_to_internal_error() {
        let error = AppError::from(RepositoryError::Unavailable("offline".to_string()));
        assert!(error.to_string().starts_with("repository error"));
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
