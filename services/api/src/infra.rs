use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hireflow::pipeline::{Candidate, CandidateGateway, CandidateId, GatewayError, JobId, StageId};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stand-in for the applicant tracking backend. Holds one roster per job, records accepted
/// stage changes, and rejects them for configured candidates.
#[derive(Clone, Default)]
pub(crate) struct InMemoryCandidateGateway {
    boards: Arc<HashMap<JobId, Vec<Candidate>>>,
    persisted: Arc<Mutex<HashMap<CandidateId, StageId>>>,
    rejecting: Arc<HashSet<CandidateId>>,
    latency: Duration,
}

impl InMemoryCandidateGateway {
    pub(crate) fn seeded(job_id: &JobId) -> Self {
        let mut boards = HashMap::new();
        boards.insert(job_id.clone(), demo_roster());
        Self {
            boards: Arc::new(boards),
            ..Self::default()
        }
    }

    pub(crate) fn rejecting<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejecting = Arc::new(
            candidates
                .into_iter()
                .map(|id| CandidateId(id.into()))
                .collect(),
        );
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Stage the backend last accepted for a candidate, falling back to the seeded roster.
    pub(crate) fn stored_stage(
        &self,
        job_id: &JobId,
        candidate_id: &CandidateId,
    ) -> Option<StageId> {
        if let Some(stage) = self
            .persisted
            .lock()
            .expect("gateway mutex poisoned")
            .get(candidate_id)
        {
            return Some(stage.clone());
        }

        self.boards
            .get(job_id)?
            .iter()
            .find(|candidate| &candidate.id == candidate_id)
            .map(|candidate| candidate.stage().clone())
    }
}

#[async_trait]
impl CandidateGateway for InMemoryCandidateGateway {
    async fn fetch_candidates(&self, job_id: &JobId) -> Result<Vec<Candidate>, GatewayError> {
        self.boards
            .get(job_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("job {job_id}")))
    }

    async fn persist_stage_change(
        &self,
        candidate_id: &CandidateId,
        stage: &StageId,
    ) -> Result<(), GatewayError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.rejecting.contains(candidate_id) {
            debug!(%candidate_id, %stage, "backend rejected stage change");
            return Err(GatewayError::Validation(format!(
                "{candidate_id} is locked by an open review"
            )));
        }

        let known = self
            .boards
            .values()
            .flatten()
            .any(|candidate| &candidate.id == candidate_id);
        if !known {
            return Err(GatewayError::NotFound(candidate_id.to_string()));
        }

        self.persisted
            .lock()
            .expect("gateway mutex poisoned")
            .insert(candidate_id.clone(), stage.clone());
        Ok(())
    }
}

fn applied(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, month, day, 14, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub(crate) fn demo_roster() -> Vec<Candidate> {
    vec![
        Candidate::new("cand-01", "Amara Okafor", StageId::from("new"), applied(9, 2))
            .with_email("amara.okafor@example.com")
            .with_fit_index(91)
            .with_tags(["rust", "distributed-systems"]),
        Candidate::new("cand-02", "Lucas Moreau", StageId::from("new"), applied(9, 5))
            .with_fit_index(64)
            .with_assignee("priya"),
        Candidate::new("cand-03", "Sofia Lindqvist", StageId::from("reviewing"), applied(8, 28))
            .with_fit_index(78)
            .with_assignee("priya")
            .with_tags(["frontend"]),
        Candidate::new("cand-04", "Daniel Kim", StageId::from("interviewing"), applied(8, 21))
            .with_fit_index(85)
            .with_assignee("marcus")
            .with_tags(["rust", "remote"]),
        Candidate::new("cand-05", "Fatima Zahra", StageId::from("interviewing"), applied(9, 1)),
        Candidate::new("cand-06", "Noah Brennan", StageId::from("offered"), applied(8, 14))
            .with_fit_index(88)
            .with_assignee("marcus"),
        Candidate::new("cand-07", "Yuki Tanaka", StageId::from("rejected"), applied(8, 30))
            .with_fit_index(35),
    ]
}
