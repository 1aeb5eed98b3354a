use async_trait::async_trait;

use super::domain::{Candidate, CandidateId, JobId};
use super::stages::StageId;

/// Backend boundary for loading a board and persisting stage changes.
///
/// `persist_stage_change` must be idempotent for a repeated target stage; the engine does
/// not deduplicate calls.
#[async_trait]
pub trait CandidateGateway: Send + Sync {
    async fn fetch_candidates(&self, job_id: &JobId) -> Result<Vec<Candidate>, GatewayError>;

    async fn persist_stage_change(
        &self,
        candidate_id: &CandidateId,
        stage: &StageId,
    ) -> Result<(), GatewayError>;
}

/// Transport or server failure reported by a gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("network unavailable: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server rejected the change: {0}")]
    Validation(String),
    #[error("change conflicts with a newer server state")]
    Conflict,
    #[error("`{0}` not found")]
    NotFound(String),
}
