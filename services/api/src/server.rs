use crate::cli::ServeArgs;
use crate::infra::{build_service, load_store, AppState};
use crate::routes::with_advocacy_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use open_advocacy::config::AppConfig;
use open_advocacy::error::AppError;
use open_advocacy::{metrics, telemetry};
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    metrics::register_metrics();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = load_store(config.dataset_path.as_deref())?;
    let service = build_service(&config, store)?;

    let app = with_advocacy_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "open advocacy service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
