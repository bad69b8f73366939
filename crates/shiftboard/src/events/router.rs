use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::EventId;
use super::service::{EventService, EventServiceError};
use crate::notifications::NotificationDispatcher;
use crate::repository::{RepositoryError, Store};

/// Router exposing the event listing, event pages, and activation.
pub fn event_router<S, N>(service: Arc<EventService<S, N>>) -> Router
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/events", get(list_handler::<S, N>))
        .route("/api/v1/events/:event_id", get(overview_handler::<S, N>))
        .route(
            "/api/v1/events/:event_id/activate",
            post(activate_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S, N>(State(service): State<Arc<EventService<S, N>>>) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.active_events() {
        Ok(events) => (StatusCode::OK, axum::Json(json!({ "events": events }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn overview_handler<S, N>(
    State(service): State<Arc<EventService<S, N>>>,
    Path(event_id): Path<String>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.event_overview(&EventId(event_id)) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activate_handler<S, N>(
    State(service): State<Arc<EventService<S, N>>>,
    Path(event_id): Path<String>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.activate(&EventId(event_id)) {
        Ok(event) => (StatusCode::OK, axum::Json(event)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: EventServiceError) -> Response {
    let status = match &error {
        EventServiceError::UnknownEvent(_)
        | EventServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EventServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EventServiceError::Registry(_) | EventServiceError::Configuration(_) => {
            StatusCode::BAD_REQUEST
        }
        EventServiceError::Repository(RepositoryError::Unavailable(_)) => {
            tracing::error!(error = %error, "repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
