use crate::cli::ServeArgs;
use crate::infra::{spawn_session_sweeper, AppState};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use skin_assess::config::AppConfig;
use skin_assess::error::AppError;
use skin_assess::telemetry;
use skin_assess::workflows::assessment::{
    AssessmentOrchestrator, ConfiguredClient, MemorySessionStore,
};
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = Arc::new(ConfiguredClient::from_config(&config.analysis)?);
    info!(
        mode = ?config.analysis.mode,
        endpoint = client.endpoint(),
        timeout_secs = config.analysis.timeout_secs,
        "analysis client configured"
    );

    let store = Arc::new(MemorySessionStore::new(
        config.funnel.session_idle_timeout(),
    ));
    spawn_session_sweeper(Arc::clone(&store));

    let orchestrator = Arc::new(AssessmentOrchestrator::new(
        client,
        store,
        config.analysis.timeout(),
    ));

    let app = with_assessment_routes(orchestrator, config.funnel.sales_page_url.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "skin assessment funnel ready");

    axum::serve(listener, app).await?;
    Ok(())
}
