use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySendLog, InMemoryTenantDirectory, InMemoryVisitStore};
use crate::routes;
use crate::seed;
use axum_prometheus::PrometheusMetricLayer;
use field_reports::config::AppConfig;
use field_reports::error::AppError;
use field_reports::reports::dispatch::WhatsAppDispatcher;
use field_reports::telemetry;
use std::path::Path;
use std::sync::atomic::Ordering;
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

    let seed = match std::env::var("APP_SEED_FILE") {
        Ok(path) => {
            info!(%path, "loading store seed");
            seed::from_file(Path::new(&path))?
        }
        Err(_) => seed::demo(),
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        tenants: Arc::new(InMemoryTenantDirectory::new(seed.tenants)),
        visits: Arc::new(InMemoryVisitStore::new(seed.salesmen, seed.visits)),
        send_log: Arc::new(InMemorySendLog::default()),
        dispatcher: Arc::new(WhatsAppDispatcher::new(config.messaging.clone())?),
    };

    let app = routes::router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "daily report dispatcher ready");

    axum::serve(listener, app).await?;
    Ok(())
}
