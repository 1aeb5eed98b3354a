//! Applicant pipeline state engine.
//!
//! The [`pipeline`] module owns the candidate collection behind both the list and kanban
//! boards, executes optimistic stage transitions with rollback, and keeps a bounded
//! undo/redo history. The remaining modules carry configuration, telemetry, and the
//! top-level error type shared with the HTTP service.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
