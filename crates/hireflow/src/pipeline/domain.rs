use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stages::StageId;

/// Identifier wrapper for applications on a board.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reference to the recruiter or hiring manager owning an application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamMemberId(pub String);

impl From<&str> for TeamMemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Job posting whose applicants populate a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const MAX_FIT_INDEX: u8 = 100;

fn clamped_fit_index<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<u64>::deserialize(deserializer)?;
    Ok(raw.map(|fit| fit.min(u64::from(MAX_FIT_INDEX)) as u8))
}

/// One applicant's progress through the pipeline.
///
/// Everything except `stage` is fixed once fetched. The stage is only writable inside the
/// crate so that transitions always go through the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub candidate_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    stage: StageId,
    #[serde(default, deserialize_with = "clamped_fit_index")]
    pub fit_index: Option<u8>,
    #[serde(default)]
    pub assignee: Option<TeamMemberId>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub applied_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        candidate_name: impl Into<String>,
        stage: StageId,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CandidateId(id.into()),
            candidate_name: candidate_name.into(),
            email: None,
            stage,
            fit_index: None,
            assignee: None,
            tags: BTreeSet::new(),
            applied_at,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Fit scores are clamped to the 0-100 range produced by the ranking service.
    pub fn with_fit_index(mut self, fit_index: u8) -> Self {
        self.fit_index = Some(fit_index.min(MAX_FIT_INDEX));
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(TeamMemberId(assignee.into()));
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn stage(&self) -> &StageId {
        &self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: StageId) {
        self.stage = stage;
    }
}

/// A stage change recorded in the undo history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub candidate_id: CandidateId,
    pub from_stage: StageId,
    pub to_stage: StageId,
    pub timestamp: DateTime<Utc>,
    /// Engine-wide issue order, used to match confirmations to the move that caused them.
    pub seq: u64,
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fit_index: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "c-1",
            "candidate_name": "Ada Lovelace",
            "stage": "new",
            "fit_index": fit_index,
            "applied_at": "2025-06-02T09:00:00Z",
        })
    }

    #[test]
    fn fetched_fit_scores_are_clamped_to_the_ranking_range() {
        let over: Candidate = serde_json::from_value(record(json!(200))).expect("record parses");
        assert_eq!(over.fit_index, Some(100));

        let far_over: Candidate =
            serde_json::from_value(record(json!(4000))).expect("record parses");
        assert_eq!(far_over.fit_index, Some(100));

        let in_range: Candidate = serde_json::from_value(record(json!(73))).expect("record parses");
        assert_eq!(in_range.fit_index, Some(73));
    }

    #[test]
    fn missing_or_null_fit_scores_stay_unranked() {
        let null: Candidate = serde_json::from_value(record(json!(null))).expect("record parses");
        assert_eq!(null.fit_index, None);

        let mut missing = record(json!(null));
        missing
            .as_object_mut()
            .expect("record is an object")
            .remove("fit_index");
        let missing: Candidate = serde_json::from_value(missing).expect("record parses");
        assert_eq!(missing.fit_index, None);
        assert!(missing.tags.is_empty());
    }

    #[test]
    fn negative_fit_scores_are_rejected() {
        let parsed = serde_json::from_value::<Candidate>(record(json!(-5)));
        assert!(parsed.is_err());
    }
}
