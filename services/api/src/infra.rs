use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use shiftboard::events::EventService;
use shiftboard::notifications::NotificationDispatcher;
use shiftboard::plugins::PluginRegistry;
use shiftboard::signup::SignupService;
use shiftboard::users::UserService;
use shiftboard::Store;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) plugins: Arc<PluginRegistry>,
}

/// The three services sharing one store, one dispatcher, and one plugin registry.
pub(crate) struct Services<S, N> {
    pub(crate) events: Arc<EventService<S, N>>,
    pub(crate) signups: Arc<SignupService<S, N>>,
    pub(crate) users: Arc<UserService<S>>,
}

impl<S, N> Services<S, N>
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    pub(crate) fn new(store: Arc<S>, notifications: Arc<N>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            events: Arc::new(EventService::new(
                store.clone(),
                notifications.clone(),
                plugins.clone(),
            )),
            signups: Arc::new(SignupService::new(store.clone(), notifications, plugins)),
            users: Arc::new(UserService::new(store)),
        }
    }
}

/// Periodically move confirmed participations of ended shifts to finished.
pub(crate) fn spawn_finisher<S, N>(
    signups: Arc<SignupService<S, N>>,
    every: Duration,
) -> JoinHandle<()>
where
    S: Store + 'static,
    N: NotificationDispatcher + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(err) = signups.finish_elapsed(Utc::now()) {
                warn!(error = %err, "finishing elapsed participations failed");
            }
        }
    })
}

pub(crate) fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
