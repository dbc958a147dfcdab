use metrics_exporter_prometheus::PrometheusHandle;
use open_advocacy::config::AppConfig;
use open_advocacy::dataset::{demo_geocoder, Dataset};
use open_advocacy::error::AppError;
use open_advocacy::lookup::geocoder_from_config;
use open_advocacy::store::InMemoryStore;
use open_advocacy::AdvocacyService;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Seeds the store from a snapshot, or from the demo data when no path is given.
pub(crate) fn load_store(dataset_path: Option<&Path>) -> Result<Arc<InMemoryStore>, AppError> {
    let dataset = match dataset_path {
        Some(path) => {
            info!(path = %path.display(), "loading dataset snapshot");
            Dataset::from_path(path)?
        }
        None => {
            info!("no dataset configured; loading demo data");
            Dataset::demo()
        }
    };
    Ok(Arc::new(dataset.into_store()?))
}

pub(crate) fn build_service(
    config: &AppConfig,
    store: Arc<InMemoryStore>,
) -> Result<Arc<AdvocacyService<InMemoryStore>>, AppError> {
    let geocoder = geocoder_from_config(&config.geocoder, demo_geocoder())?;
    info!(
        provider = config.geocoder.provider.label(),
        timeout_secs = config.geocoder.timeout.as_secs(),
        cached = config.geocoder.cache_ttl.is_some(),
        "geocoder configured"
    );
    Ok(Arc::new(
        AdvocacyService::new(store, geocoder).with_geocode_timeout(config.geocoder.timeout),
    ))
}
