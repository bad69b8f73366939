use crate::cli::ServeArgs;
use crate::demo::seed_demo_data;
use crate::infra::{spawn_finisher, AppState, Services};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use shiftboard::config::AppConfig;
use shiftboard::error::AppError;
use shiftboard::notifications::LogNotifications;
use shiftboard::plugins::PluginRegistry;
use shiftboard::telemetry;
use shiftboard::InMemoryStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let plugins = Arc::new(PluginRegistry::builtin(&config.plugins));
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        plugins: plugins.clone(),
    };

    let store = Arc::new(InMemoryStore::new());
    if args.seed_demo {
        seed_demo_data(&store, Utc::now())?;
        info!("demo data seeded");
    }
    let services = Services::new(store, Arc::new(LogNotifications), plugins);
    let finisher = spawn_finisher(services.signups.clone(), config.scheduler.finish_interval);

    let app = with_application_routes(&services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shiftboard ready");

    let served = axum::serve(listener, app).await;
    finisher.abort();
    served?;
    Ok(())
}
