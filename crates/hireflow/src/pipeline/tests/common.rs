use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::config::PipelineConfig;
use crate::pipeline::domain::{Candidate, CandidateId, JobId};
use crate::pipeline::gateway::{CandidateGateway, GatewayError};
use crate::pipeline::stages::{StageId, StageRegistry};
use crate::pipeline::PipelineEngine;

pub(super) fn stage(id: &str) -> StageId {
    StageId::from(id)
}

pub(super) fn id(value: &str) -> CandidateId {
    CandidateId::from(value)
}

pub(super) fn candidates() -> Vec<Candidate> {
    let applied = |day: u32| Utc.with_ymd_and_hms(2025, 6, day, 10, 0, 0).unwrap();
    vec![
        Candidate::new("1", "Ada Lovelace", stage("new"), applied(2))
            .with_email("ada@example.com")
            .with_fit_index(90)
            .with_tags(["backend"]),
        Candidate::new("2", "Grace Hopper", stage("new"), applied(3))
            .with_fit_index(40)
            .with_assignee("rhea"),
        Candidate::new("3", "Alan Turing", stage("reviewing"), applied(1))
            .with_fit_index(75)
            .with_tags(["backend", "remote"]),
        Candidate::new("4", "Katherine Johnson", stage("interviewing"), applied(5))
            .with_assignee("omar"),
    ]
}

pub(super) fn config() -> PipelineConfig {
    PipelineConfig::new("job-001")
}

pub(super) fn engine_with(gateway: Arc<MemoryGateway>) -> PipelineEngine<MemoryGateway> {
    PipelineEngine::with_candidates(gateway, StageRegistry::standard(), &config(), candidates())
        .expect("fixture board builds")
}

pub(super) fn build_engine() -> (PipelineEngine<MemoryGateway>, Arc<MemoryGateway>) {
    let gateway = Arc::new(MemoryGateway::default());
    (engine_with(gateway.clone()), gateway)
}

pub(super) fn stage_of<G>(engine: &PipelineEngine<G>, candidate: &str) -> String
where
    G: CandidateGateway + 'static,
{
    engine
        .candidate(&id(candidate))
        .map(|record| record.stage().to_string())
        .expect("candidate present")
}

/// Gateway that persists immediately, failing for selected candidates.
#[derive(Default)]
pub(super) struct MemoryGateway {
    failing: Mutex<HashSet<CandidateId>>,
    calls: Mutex<Vec<(CandidateId, StageId)>>,
    fetches: AtomicUsize,
}

impl MemoryGateway {
    pub(super) fn fail_for(&self, candidate: &str) {
        self.failing
            .lock()
            .expect("gateway mutex poisoned")
            .insert(id(candidate));
    }

    pub(super) fn recover(&self, candidate: &str) {
        self.failing
            .lock()
            .expect("gateway mutex poisoned")
            .remove(&id(candidate));
    }

    pub(super) fn calls(&self) -> Vec<(CandidateId, StageId)> {
        self.calls.lock().expect("gateway mutex poisoned").clone()
    }

    pub(super) fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateGateway for MemoryGateway {
    async fn fetch_candidates(&self, job_id: &JobId) -> Result<Vec<Candidate>, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if job_id.0 != "job-001" {
            return Err(GatewayError::NotFound(job_id.0.clone()));
        }
        Ok(candidates())
    }

    async fn persist_stage_change(
        &self,
        candidate_id: &CandidateId,
        stage: &StageId,
    ) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .expect("gateway mutex poisoned")
            .push((candidate_id.clone(), stage.clone()));

        let failing = self
            .failing
            .lock()
            .expect("gateway mutex poisoned")
            .contains(candidate_id);
        if failing {
            Err(GatewayError::Network("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

type Reply = oneshot::Sender<Result<(), GatewayError>>;

/// Gateway whose calls stay pending until the test resolves them.
#[derive(Default)]
pub(super) struct GatedGateway {
    pending: Mutex<Vec<(CandidateId, StageId, Option<Reply>)>>,
}

impl GatedGateway {
    pub(super) fn pending_count(&self) -> usize {
        self.pending.lock().expect("gateway mutex poisoned").len()
    }

    /// Resolve the `index`-th call in issue order.
    pub(super) fn resolve(&self, index: usize, result: Result<(), GatewayError>) {
        let reply = self.pending.lock().expect("gateway mutex poisoned")[index]
            .2
            .take()
            .expect("call resolved once");
        reply.send(result).expect("mover still waiting");
    }

    pub(super) async fn wait_for_calls(&self, count: usize) {
        for _ in 0..1_000 {
            if self.pending_count() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {count} persistence calls");
    }
}

#[async_trait]
impl CandidateGateway for GatedGateway {
    async fn fetch_candidates(&self, _job_id: &JobId) -> Result<Vec<Candidate>, GatewayError> {
        Ok(candidates())
    }

    async fn persist_stage_change(
        &self,
        candidate_id: &CandidateId,
        stage: &StageId,
    ) -> Result<(), GatewayError> {
        let (reply, receiver) = oneshot::channel();
        self.pending.lock().expect("gateway mutex poisoned").push((
            candidate_id.clone(),
            stage.clone(),
            Some(reply),
        ));
        receiver.await.unwrap_or(Err(GatewayError::Timeout))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
