use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCandidateGateway};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hireflow::config::AppConfig;
use hireflow::error::AppError;
use hireflow::pipeline::{PipelineEngine, StageRegistry};
use hireflow::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const BACKEND_LATENCY: Duration = Duration::from_millis(150);

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

    let gateway = Arc::new(
        InMemoryCandidateGateway::seeded(&config.pipeline.job_id)
            .rejecting(args.fail_candidates)
            .with_latency(BACKEND_LATENCY),
    );
    let engine = Arc::new(
        PipelineEngine::load(gateway, StageRegistry::standard(), &config.pipeline).await?,
    );

    let app = with_pipeline_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        job_id = %config.pipeline.job_id,
        strict_stages = config.pipeline.strict_stage_references,
        "pipeline board service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
