use crate::cli::ServeArgs;
use crate::infra::{AppState, MemoryIdentityProvider};
use crate::routes::app_router;
use axum_prometheus::PrometheusMetricLayer;
use fin_insight::config::{AppConfig, ConfigError, IdentityBackend};
use fin_insight::error::AppError;
use fin_insight::identity::{FirebaseIdentityProvider, IdentityProvider};
use fin_insight::inference::{InferenceClient, InferenceService};
use fin_insight::presentation::SegmentCatalog;
use fin_insight::telemetry;
use fin_insight::workflow::WorkspaceRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

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
    let readiness_flag = Arc::new(AtomicBool::new(false));

    let provider: Arc<dyn IdentityProvider> = match config.identity.backend {
        IdentityBackend::Memory => {
            warn!("using in-memory identity backend; accounts are lost on restart");
            Arc::new(MemoryIdentityProvider::default())
        }
        IdentityBackend::Firebase => {
            let client = reqwest::Client::builder().build()?;
            Arc::new(
                FirebaseIdentityProvider::from_config(client, &config.identity)
                    .ok_or(ConfigError::MissingApiKey)?,
            )
        }
    };

    let inference: Arc<dyn InferenceService> = Arc::new(InferenceClient::new(&config.inference)?);

    let catalog = match &config.presentation.catalog_path {
        Some(path) => {
            info!(path = %path.display(), "loading segment catalog");
            SegmentCatalog::load(path)?
        }
        None => SegmentCatalog::standard(),
    };

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        workspaces: Arc::new(WorkspaceRegistry::new(provider, inference)),
        catalog: Arc::new(catalog),
    };

    let app = app_router(app_state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        inference = %config.inference.base_url,
        identity = ?config.identity.backend,
        "fin insight service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
