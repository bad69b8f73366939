use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;

use super::domain::UserId;
use super::service::{UserService, UserServiceError};
use crate::repository::{RepositoryError, Store};

/// Router exposing per-user working hours and qualifications.
pub fn user_router<S>(service: Arc<UserService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/working-hours",
            get(working_hours_handler::<S>),
        )
        .route(
            "/api/v1/users/:user_id/qualifications",
            get(qualifications_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn working_hours_handler<S>(
    State(service): State<Arc<UserService<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: Store + 'static,
{
    match service.working_hours(&UserId(user_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn qualifications_handler<S>(
    State(service): State<Arc<UserService<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: Store + 'static,
{
    match service.qualifications(&UserId(user_id), Utc::now()) {
        Ok(held) => {
            (StatusCode::OK, axum::Json(json!({ "qualifications": held }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: UserServiceError) -> Response {
    let status = match &error {
        UserServiceError::UnknownUser(_)
        | UserServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        UserServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        UserServiceError::Repository(RepositoryError::Unavailable(_)) => {
            tracing::error!(error = %error, "repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
