use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use hireflow::pipeline::{pipeline_router, CandidateGateway, PipelineEngine};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_pipeline_routes<G>(engine: Arc<PipelineEngine<G>>) -> axum::Router
where
    G: CandidateGateway + 'static,
{
    pipeline_router(engine)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryCandidateGateway;
    use axum::body::Body;
    use axum::http::Request;
    use hireflow::config::PipelineConfig;
    use hireflow::pipeline::{CandidateId, JobId, StageId, StageRegistry};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn engine(
        gateway: InMemoryCandidateGateway,
    ) -> Arc<PipelineEngine<InMemoryCandidateGateway>> {
        let engine = PipelineEngine::load(
            Arc::new(gateway),
            StageRegistry::standard(),
            &PipelineConfig::new("job-001"),
        )
        .await
        .expect("seeded board loads");
        Arc::new(engine)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    fn move_request(candidate: &str, stage: &str) -> Request<Body> {
        let body = json!({ "candidate_id": candidate, "to_stage": stage });
        Request::post("/api/v1/pipeline/moves")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flagged() {
        let response = readiness_endpoint(Extension(app_state(false)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readiness_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn health_route_is_served_alongside_the_board() {
        let gateway = InMemoryCandidateGateway::seeded(&JobId("job-001".to_string()));
        let app = with_pipeline_routes(engine(gateway).await);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn accepted_moves_reach_the_backend() {
        let job = JobId("job-001".to_string());
        let gateway = InMemoryCandidateGateway::seeded(&job);
        let app = with_pipeline_routes(engine(gateway.clone()).await);

        let response = app
            .oneshot(move_request("cand-02", "reviewing"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            gateway.stored_stage(&job, &CandidateId::from("cand-02")),
            Some(StageId::from("reviewing"))
        );
    }

    #[tokio::test]
    async fn rejected_moves_roll_back_and_surface_a_notice() {
        let job = JobId("job-001".to_string());
        let gateway = InMemoryCandidateGateway::seeded(&job).rejecting(["cand-04"]);
        let engine = engine(gateway.clone()).await;
        let app = with_pipeline_routes(engine.clone());

        let response = app
            .oneshot(move_request("cand-04", "offered"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let payload = json_body(response).await;
        assert!(payload["notice"]["message"]
            .as_str()
            .expect("message")
            .contains("Daniel Kim"));
        assert_eq!(
            gateway.stored_stage(&job, &CandidateId::from("cand-04")),
            Some(StageId::from("interviewing"))
        );
        assert_eq!(
            engine
                .candidate(&CandidateId::from("cand-04"))
                .map(|candidate| candidate.stage().clone()),
            Some(StageId::from("interviewing"))
        );
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_prometheus_text() {
        let response = metrics_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
