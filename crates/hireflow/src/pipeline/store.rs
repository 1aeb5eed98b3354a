use std::collections::HashMap;

use super::domain::{Candidate, CandidateId};
use super::stages::{StageId, StageRegistry};
use super::PipelineError;

/// Authoritative in-memory collection of a job's applications.
///
/// Records keep their fetch order, which is the tie-breaker for every sort.
#[derive(Debug, Clone, Default)]
pub struct CandidateStore {
    records: Vec<Candidate>,
    index: HashMap<CandidateId, usize>,
}

impl CandidateStore {
    pub fn from_records(
        records: Vec<Candidate>,
        registry: &StageRegistry,
    ) -> Result<Self, PipelineError> {
        let mut index = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            if !registry.contains(record.stage()) {
                return Err(PipelineError::InvalidStageReference(record.stage().clone()));
            }
            if index.insert(record.id.clone(), position).is_some() {
                return Err(PipelineError::DuplicateCandidate(record.id.clone()));
            }
        }

        Ok(Self { records, index })
    }

    pub fn records(&self) -> &[Candidate] {
        &self.records
    }

    pub fn get(&self, id: &CandidateId) -> Option<&Candidate> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writes a stage and returns the previous one. Callers validate the stage first.
    pub(crate) fn set_stage(
        &mut self,
        id: &CandidateId,
        stage: StageId,
    ) -> Result<StageId, PipelineError> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| PipelineError::UnknownCandidate(id.clone()))?;
        let record = &mut self.records[position];
        let previous = record.stage().clone();
        record.set_stage(stage);
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candidate(id: &str, stage: &str) -> Candidate {
        let applied_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Candidate::new(id, format!("Candidate {id}"), StageId::from(stage), applied_at)
    }

    #[test]
    fn preserves_fetch_order_and_indexes_by_id() {
        let registry = StageRegistry::standard();
        let store = CandidateStore::from_records(
            vec![candidate("c", "new"), candidate("a", "hired"), candidate("b", "new")],
            &registry,
        )
        .expect("store builds");

        let ids: Vec<&str> = store.records().iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(
            store.get(&CandidateId::from("a")).map(|c| c.stage().as_str()),
            Some("hired")
        );
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
    }

    #[test]
    fn a_job_without_applications_builds_an_empty_store() {
        let store = CandidateStore::from_records(Vec::new(), &StageRegistry::standard())
            .expect("empty store builds");

        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.get(&CandidateId::from("a")).is_none());
    }

    #[test]
    fn rejects_unknown_stages_and_duplicate_ids() {
        let registry = StageRegistry::standard();

        let unknown = CandidateStore::from_records(vec![candidate("a", "archived")], &registry);
        assert!(matches!(
            unknown,
            Err(PipelineError::InvalidStageReference(stage)) if stage.as_str() == "archived"
        ));

        let duplicate = CandidateStore::from_records(
            vec![candidate("a", "new"), candidate("a", "reviewing")],
            &registry,
        );
        assert!(matches!(duplicate, Err(PipelineError::DuplicateCandidate(_))));
    }

    #[test]
    fn set_stage_returns_previous_value() {
        let registry = StageRegistry::standard();
        let mut store =
            CandidateStore::from_records(vec![candidate("a", "new")], &registry).expect("store");

        let previous = store
            .set_stage(&CandidateId::from("a"), StageId::from("reviewing"))
            .expect("known candidate");
        assert_eq!(previous.as_str(), "new");
        assert_eq!(
            store.get(&CandidateId::from("a")).map(|c| c.stage().as_str()),
            Some("reviewing")
        );

        let missing = store.set_stage(&CandidateId::from("zz"), StageId::from("new"));
        assert!(matches!(missing, Err(PipelineError::UnknownCandidate(_))));
    }
}
