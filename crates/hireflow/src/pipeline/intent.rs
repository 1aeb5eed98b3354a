use serde::{Deserialize, Serialize};

use super::domain::CandidateId;
use super::stages::StageId;

/// Normalized board input. Pointer, touch, and keyboard sensors all reduce to these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum BoardIntent {
    PickUp {
        candidate_id: CandidateId,
    },
    HoverOver {
        candidate_id: CandidateId,
        stage: StageId,
    },
    Drop {
        candidate_id: CandidateId,
        stage: StageId,
    },
    /// Arrow key while dragging: hover the column next to `over`.
    Step {
        candidate_id: CandidateId,
        over: StageId,
        direction: KeyboardDirection,
    },
    Cancel {
        candidate_id: CandidateId,
    },
    Undo,
    Redo,
}

/// Arrow-key direction across board columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardDirection {
    Previous,
    Next,
}
