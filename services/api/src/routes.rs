use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use shiftboard::events::event_router;
use shiftboard::notifications::NotificationDispatcher;
use shiftboard::signup::signup_router;
use shiftboard::users::user_router;
use shiftboard::Store;

pub(crate) fn with_application_routes<S, N>(services: &Services<S, N>) -> Router
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    event_router(services.events.clone())
        .merge(signup_router(services.signups.clone()))
        .merge(user_router(services.users.clone()))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/plugins", get(plugins_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn plugins_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    Json(json!({ "plugins": state.plugins.summaries() }))
}
