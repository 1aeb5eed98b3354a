use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::CandidateId;
use super::engine::{MoveOutcome, Notice, PipelineEngine, UndoOutcome};
use super::gateway::CandidateGateway;
use super::intent::BoardIntent;
use super::projection::{FilterCriteria, SortKey};
use super::stages::{Stage, StageId};
use super::views::{BoardView, ViewMode};
use super::PipelineError;

/// Router exposing the board's render surface and move endpoints.
pub fn pipeline_router<G>(engine: Arc<PipelineEngine<G>>) -> Router
where
    G: CandidateGateway + 'static,
{
    Router::new()
        .route("/api/v1/pipeline", get(board_handler::<G>))
        .route("/api/v1/pipeline/stages", get(stages_handler::<G>))
        .route("/api/v1/pipeline/moves", post(move_handler::<G>))
        .route("/api/v1/pipeline/intents", post(intent_handler::<G>))
        .route("/api/v1/pipeline/undo", post(undo_handler::<G>))
        .route("/api/v1/pipeline/redo", post(redo_handler::<G>))
        .route("/api/v1/pipeline/filter", put(filter_handler::<G>))
        .route("/api/v1/pipeline/sort", put(sort_handler::<G>))
        .route(
            "/api/v1/pipeline/announcement",
            get(announcement_handler::<G>),
        )
        .route(
            "/api/v1/pipeline/notices/:notice_id",
            delete(dismiss_notice_handler::<G>),
        )
        .with_state(engine)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BoardQuery {
    #[serde(default)]
    pub(crate) view: ViewMode,
}

#[derive(Debug, Serialize)]
struct BoardResponse<'a> {
    revision: u64,
    criteria: &'a FilterCriteria,
    sort: SortKey,
    undo_depth: usize,
    redo_depth: usize,
    notices: &'a [Notice],
    announcement: &'a str,
    board: BoardView<'a>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MoveRequest {
    pub candidate_id: CandidateId,
    pub to_stage: StageId,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SortRequest {
    pub sort: SortKey,
}

pub(crate) async fn board_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
    Query(query): Query<BoardQuery>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    let snapshot = engine.snapshot();
    let body = BoardResponse {
        revision: snapshot.revision,
        criteria: &snapshot.criteria,
        sort: snapshot.sort,
        undo_depth: snapshot.undo_depth,
        redo_depth: snapshot.redo_depth,
        notices: &snapshot.notices,
        announcement: &snapshot.announcement,
        board: snapshot.view(engine.registry(), query.view),
    };
    (StatusCode::OK, axum::Json(body)).into_response()
}

pub(crate) async fn stages_handler<G>(State(engine): State<Arc<PipelineEngine<G>>>) -> Response
where
    G: CandidateGateway + 'static,
{
    let stages: Vec<Stage> = engine.registry().stages().to_vec();
    (StatusCode::OK, axum::Json(stages)).into_response()
}

pub(crate) async fn move_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
    axum::Json(request): axum::Json<MoveRequest>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    if !engine.registry().contains(&request.to_stage) {
        return unknown_stage_response(&request.to_stage);
    }

    match engine
        .move_candidate(&request.candidate_id, &request.to_stage)
        .await
    {
        Ok(outcome) => {
            let status = match outcome {
                MoveOutcome::Failed(_) => StatusCode::CONFLICT,
                _ => StatusCode::OK,
            };
            (status, axum::Json(outcome)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn intent_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
    axum::Json(intent): axum::Json<BoardIntent>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    let target = match &intent {
        BoardIntent::HoverOver { stage, .. } | BoardIntent::Drop { stage, .. } => Some(stage),
        BoardIntent::Step { over, .. } => Some(over),
        _ => None,
    };
    if let Some(stage) = target {
        if !engine.registry().contains(stage) {
            return unknown_stage_response(stage);
        }
    }

    match engine.dispatch(intent).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn undo_handler<G>(State(engine): State<Arc<PipelineEngine<G>>>) -> Response
where
    G: CandidateGateway + 'static,
{
    match engine.undo().await {
        Ok(outcome) => history_response(outcome),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn redo_handler<G>(State(engine): State<Arc<PipelineEngine<G>>>) -> Response
where
    G: CandidateGateway + 'static,
{
    match engine.redo().await {
        Ok(outcome) => history_response(outcome),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn filter_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
    axum::Json(criteria): axum::Json<FilterCriteria>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    engine.set_filter(criteria);
    let snapshot = engine.snapshot();
    let payload = json!({
        "revision": snapshot.revision,
        "active_filters": snapshot.criteria.active_count(),
        "visible": snapshot.projection.len(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn sort_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
    axum::Json(request): axum::Json<SortRequest>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    engine.set_sort(request.sort);
    let payload = json!({
        "sort": request.sort,
        "label": request.sort.label(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn announcement_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    let payload = json!({ "announcement": engine.announcement() });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn dismiss_notice_handler<G>(
    State(engine): State<Arc<PipelineEngine<G>>>,
    Path(notice_id): Path<u64>,
) -> Response
where
    G: CandidateGateway + 'static,
{
    if engine.dismiss_notice(notice_id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let payload = json!({ "error": format!("notice {notice_id} not found") });
        (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
    }
}

fn history_response(outcome: UndoOutcome) -> Response {
    let status = match outcome {
        UndoOutcome::Failed(_) => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    (status, axum::Json(outcome)).into_response()
}

fn unknown_stage_response(stage: &StageId) -> Response {
    let payload = json!({
        "error": format!("stage `{stage}` is not part of the pipeline"),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn error_response(err: PipelineError) -> Response {
    let status = match err {
        PipelineError::UnknownCandidate(_) => StatusCode::NOT_FOUND,
        PipelineError::InvalidStageReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Gateway(_) => StatusCode::BAD_GATEWAY,
        PipelineError::DuplicateCandidate(_)
        | PipelineError::DuplicateStage(_)
        | PipelineError::EmptyRegistry => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
