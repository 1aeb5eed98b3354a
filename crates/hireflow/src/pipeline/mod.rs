//! Applicant pipeline state engine.
//!
//! One [`CandidateStore`] per job board feeds a pure filter/sort [`project`]ion which the
//! list and kanban views both render from. Stage changes go through [`PipelineEngine`],
//! which applies them optimistically, persists them through a [`CandidateGateway`], and
//! rolls back on failure. Recent moves are kept in a bounded [`TransitionHistory`] for
//! undo and redo.

pub mod announcer;
pub mod domain;
pub mod engine;
pub mod gateway;
pub mod intent;
pub mod projection;
pub mod router;
pub mod stages;
pub mod store;
pub mod undo;
pub mod views;

#[cfg(test)]
mod tests;

pub use announcer::{Announcer, AnnouncerEvent};
pub use domain::{Candidate, CandidateId, JobId, TeamMemberId, Transition};
pub use engine::{
    ChangeReason, IntentOutcome, MoveOutcome, MoveTicket, Notice, NoticeKind, PendingMove,
    PipelineEngine, PipelineSnapshot, Settlement, StoreChange, UndoOutcome, NOTICE_CAPACITY,
};
pub use gateway::{CandidateGateway, GatewayError};
pub use intent::{BoardIntent, KeyboardDirection};
pub use projection::{project, FilterCriteria, SortKey};
pub use router::pipeline_router;
pub use stages::{Stage, StageId, StageRegistry};
pub use store::CandidateStore;
pub use undo::{TransitionHistory, UNDO_CAPACITY};
pub use views::{BoardView, KanbanBoard, KanbanColumn, ListView, ViewMode};

/// Errors raised by the pipeline outside the expected move-failure path.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("stage `{0}` is not part of the pipeline")]
    InvalidStageReference(StageId),
    #[error("candidate `{0}` is not on this board")]
    UnknownCandidate(CandidateId),
    #[error("candidate `{0}` appears more than once")]
    DuplicateCandidate(CandidateId),
    #[error("stage `{0}` is registered twice")]
    DuplicateStage(StageId),
    #[error("the stage registry is empty")]
    EmptyRegistry,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
