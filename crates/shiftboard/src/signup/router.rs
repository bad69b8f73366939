use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::disposition::DispositionDecision;
use super::participant::ParticipantRequest;
use super::service::{SignupService, SignupServiceError};
use crate::events::domain::ShiftId;
use crate::events::participation::ParticipantRef;
use crate::notifications::NotificationDispatcher;
use crate::repository::{RepositoryError, Store};
use crate::users::domain::UserId;

/// Body of signup and decline requests.
#[derive(Debug, Deserialize)]
pub struct ParticipationRequestBody {
    pub participant: ParticipantRequest,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct DispositionBody {
    pub decisions: Vec<DispositionDecision>,
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantBody {
    pub user_id: UserId,
}

/// Optional viewer for the shift state, so their own participation can be shown.
#[derive(Debug, Default, Deserialize)]
pub struct ShiftStateQuery {
    pub user_id: Option<String>,
    pub guest_email: Option<String>,
}

impl ShiftStateQuery {
    fn viewer(self) -> Option<ParticipantRef> {
        match (self.user_id, self.guest_email) {
            (Some(user), _) => Some(ParticipantRef::Local(UserId(user))),
            (None, Some(email)) => Some(ParticipantRef::Guest {
                email: email.trim().to_ascii_lowercase(),
            }),
            (None, None) => None,
        }
    }
}

/// Router exposing signup, decline, shift state, and disposition endpoints.
pub fn signup_router<S, N>(service: Arc<SignupService<S, N>>) -> Router
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/signup-methods", get(methods_handler::<S, N>))
        .route("/api/v1/shifts/:shift_id/signup", post(signup_handler::<S, N>))
        .route("/api/v1/shifts/:shift_id/decline", post(decline_handler::<S, N>))
        .route("/api/v1/shifts/:shift_id/state", get(state_handler::<S, N>))
        .route(
            "/api/v1/shifts/:shift_id/disposition",
            get(disposition_handler::<S, N>).post(dispose_handler::<S, N>),
        )
        .route(
            "/api/v1/shifts/:shift_id/disposition/participants",
            post(add_participant_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn methods_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    let payload = json!({ "signup_methods": service.signup_methods() });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn signup_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
    Path(shift_id): Path<String>,
    axum::Json(body): axum::Json<ParticipationRequestBody>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    let shift_id = ShiftId(shift_id);
    match service.perform_signup(&shift_id, body.participant, body.data, Utc::now()) {
        Ok(participation) => (StatusCode::CREATED, axum::Json(participation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decline_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
    Path(shift_id): Path<String>,
    axum::Json(body): axum::Json<ParticipationRequestBody>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    let shift_id = ShiftId(shift_id);
    match service.perform_decline(&shift_id, body.participant, Utc::now()) {
        Ok(participation) => (StatusCode::OK, axum::Json(participation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn state_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
    Path(shift_id): Path<String>,
    Query(query): Query<ShiftStateQuery>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    let shift_id = ShiftId(shift_id);
    let viewer = query.viewer();
    match service.shift_state(&shift_id, viewer.as_ref()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn disposition_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
    Path(shift_id): Path<String>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.disposition_view(&ShiftId(shift_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dispose_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
    Path(shift_id): Path<String>,
    axum::Json(body): axum::Json<DispositionBody>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.dispose(&ShiftId(shift_id), body.decisions, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_participant_handler<S, N>(
    State(service): State<Arc<SignupService<S, N>>>,
    Path(shift_id): Path<String>,
    axum::Json(body): axum::Json<AddParticipantBody>,
) -> Response
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    match service.add_participant(&ShiftId(shift_id), &body.user_id, Utc::now()) {
        Ok(participation) => (StatusCode::CREATED, axum::Json(participation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: SignupServiceError) -> Response {
    let status = match &error {
        SignupServiceError::Rejected(errors) => {
            let payload = json!({
                "error": error.to_string(),
                "errors": errors,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
        SignupServiceError::UnknownShift(_)
        | SignupServiceError::UnknownEvent(_)
        | SignupServiceError::UnknownUser(_)
        | SignupServiceError::UnknownParticipation(_)
        | SignupServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SignupServiceError::Transition(_)
        | SignupServiceError::ParticipationMismatch { .. }
        | SignupServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SignupServiceError::DispositionUnsupported(_)
        | SignupServiceError::Configuration(_)
        | SignupServiceError::Registry(_) => StatusCode::BAD_REQUEST,
        SignupServiceError::GuestsDisabled => StatusCode::FORBIDDEN,
        SignupServiceError::Repository(RepositoryError::Unavailable(_)) => {
            tracing::error!(error = %error, "repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
