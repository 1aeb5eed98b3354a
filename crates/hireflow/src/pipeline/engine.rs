use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use super::announcer::{Announcer, AnnouncerEvent};
use super::domain::{Candidate, CandidateId, JobId, Transition};
use super::gateway::{CandidateGateway, GatewayError};
use super::intent::BoardIntent;
use super::projection::{project, FilterCriteria, SortKey};
use super::stages::{StageId, StageRegistry};
use super::store::CandidateStore;
use super::undo::TransitionHistory;
use super::views::{BoardView, ViewMode};
use super::PipelineError;
use crate::config::PipelineConfig;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Undismissed notices kept per board; the oldest is dropped first.
pub const NOTICE_CAPACITY: usize = 5;

/// Result of a stage move once its persistence call has resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "notice", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// Candidate was already in the target stage; nothing was sent.
    Unchanged,
    Confirmed,
    /// Persistence failed and the optimistic change was rolled back.
    Failed(Notice),
    /// A newer move for the same candidate was issued before this one resolved.
    Superseded,
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum UndoOutcome {
    Empty,
    Applied(Transition),
    Failed(Notice),
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum IntentOutcome {
    Announced,
    /// Keyboard step resolved to this column; it stays put at either edge.
    Targeted(StageId),
    Moved(MoveOutcome),
    Undo(UndoOutcome),
    Redo(UndoOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    TransitionRejected,
    UndoFailed,
    RedoFailed,
}

/// Dismissible user-facing message raised when a move had to be rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub candidate_id: CandidateId,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Moved,
    Reverted,
    FilterChanged,
    SortChanged,
    NoticesChanged,
}

/// Broadcast to render subscribers whenever the board's observable state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreChange {
    pub revision: u64,
    pub reason: ChangeReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<CandidateId>,
}

/// Everything a renderer needs, captured under one lock.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSnapshot {
    pub revision: u64,
    pub criteria: FilterCriteria,
    pub sort: SortKey,
    pub projection: Vec<Candidate>,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub notices: Vec<Notice>,
    pub announcement: String,
}

impl PipelineSnapshot {
    pub fn view<'a>(&'a self, registry: &'a StageRegistry, mode: ViewMode) -> BoardView<'a> {
        let rows: Vec<&Candidate> = self.projection.iter().collect();
        BoardView::render(&rows, registry, mode)
    }
}

#[derive(Debug, Clone)]
enum MoveOrigin {
    User,
    Undo(Transition),
    Redo(Transition),
}

impl MoveOrigin {
    fn notice_kind(&self) -> NoticeKind {
        match self {
            MoveOrigin::User => NoticeKind::TransitionRejected,
            MoveOrigin::Undo(_) => NoticeKind::UndoFailed,
            MoveOrigin::Redo(_) => NoticeKind::RedoFailed,
        }
    }
}

/// Optimistically applied move awaiting its persistence result.
#[derive(Debug, Clone)]
pub struct PendingMove {
    transition: Transition,
    origin: MoveOrigin,
}

impl PendingMove {
    pub fn transition(&self) -> &Transition {
        &self.transition
    }

    pub fn candidate_id(&self) -> &CandidateId {
        &self.transition.candidate_id
    }

    pub fn to_stage(&self) -> &StageId {
        &self.transition.to_stage
    }
}

#[derive(Debug, Clone)]
pub enum MoveTicket {
    Unchanged,
    Pending(PendingMove),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Confirmed,
    Superseded,
    Reverted(Notice),
}

/// Per-candidate view of what the backend has accepted and which moves still await a reply.
///
/// A rollback never lands on a stage outside this ledger: it is either the newest stage
/// still in flight or the last one the backend confirmed.
#[derive(Debug, Default)]
struct ServerLedger {
    confirmed: HashMap<CandidateId, (u64, StageId)>,
    in_flight: HashMap<CandidateId, Vec<(u64, StageId)>>,
}

impl ServerLedger {
    fn seeded(records: &[Candidate]) -> Self {
        let confirmed = records
            .iter()
            .map(|record| (record.id.clone(), (0, record.stage().clone())))
            .collect();
        Self {
            confirmed,
            in_flight: HashMap::new(),
        }
    }

    fn issue(&mut self, candidate_id: &CandidateId, seq: u64, stage: StageId) {
        self.in_flight
            .entry(candidate_id.clone())
            .or_default()
            .push((seq, stage));
    }

    fn confirmed_seq(&self, candidate_id: &CandidateId) -> u64 {
        self.confirmed
            .get(candidate_id)
            .map_or(0, |(seq, _)| *seq)
    }

    /// Takes `seq` out of flight. Returns whether it was the newest move for the candidate,
    /// i.e. nothing later is in flight and nothing later was confirmed.
    fn resolve(&mut self, candidate_id: &CandidateId, seq: u64) -> bool {
        let confirmed_seq = self.confirmed_seq(candidate_id);
        let Some(moves) = self.in_flight.get_mut(candidate_id) else {
            return false;
        };

        let newest = moves.last().map(|(last, _)| *last) == Some(seq) && seq > confirmed_seq;
        moves.retain(|(pending, _)| *pending != seq);
        if moves.is_empty() {
            self.in_flight.remove(candidate_id);
        }
        newest
    }

    /// Confirmations only advance; an older success never overwrites a newer one.
    fn confirm(&mut self, candidate_id: &CandidateId, seq: u64, stage: StageId) {
        if seq > self.confirmed_seq(candidate_id) {
            self.confirmed.insert(candidate_id.clone(), (seq, stage));
        }
    }

    /// Stage to show once the newest move failed.
    fn fallback(&self, candidate_id: &CandidateId) -> Option<&StageId> {
        let pending = self
            .in_flight
            .get(candidate_id)
            .and_then(|moves| moves.last());
        let confirmed = self.confirmed.get(candidate_id);

        match (pending, confirmed) {
            (Some((pending_seq, pending)), Some((confirmed_seq, confirmed))) => {
                Some(if pending_seq > confirmed_seq {
                    pending
                } else {
                    confirmed
                })
            }
            (Some((_, stage)), None) | (None, Some((_, stage))) => Some(stage),
            (None, None) => None,
        }
    }
}

#[derive(Debug)]
struct BoardState {
    store: CandidateStore,
    history: TransitionHistory,
    criteria: FilterCriteria,
    sort: SortKey,
    ledger: ServerLedger,
    next_seq: u64,
    notices: Vec<Notice>,
    next_notice_id: u64,
    revision: u64,
}

/// Owns the candidate store, the undo history, and the filter state for one job board.
///
/// Every mutation happens synchronously under a single lock. The only suspension point is
/// the persistence call inside [`PipelineEngine::move_candidate`], [`PipelineEngine::undo`]
/// and [`PipelineEngine::redo`]; confirmations may therefore arrive out of order, and a
/// confirmation only settles the store while it belongs to the newest move for its
/// candidate, and a failure rolls back to the newest stage still in flight or confirmed.
pub struct PipelineEngine<G> {
    job_id: JobId,
    registry: StageRegistry,
    gateway: Arc<G>,
    strict_stage_references: bool,
    state: Mutex<BoardState>,
    announcer: Announcer,
    changes: broadcast::Sender<StoreChange>,
}

impl<G> PipelineEngine<G>
where
    G: CandidateGateway + 'static,
{
    /// Fetch the job's candidates once and build the board.
    pub async fn load(
        gateway: Arc<G>,
        registry: StageRegistry,
        config: &PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let records = gateway.fetch_candidates(&config.job_id).await?;
        info!(job_id = %config.job_id, candidates = records.len(), "pipeline board loaded");
        Self::with_candidates(gateway, registry, config, records)
    }

    pub fn with_candidates(
        gateway: Arc<G>,
        registry: StageRegistry,
        config: &PipelineConfig,
        records: Vec<Candidate>,
    ) -> Result<Self, PipelineError> {
        let store = CandidateStore::from_records(records, &registry)?;
        let ledger = ServerLedger::seeded(store.records());
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            job_id: config.job_id.clone(),
            registry,
            gateway,
            strict_stage_references: config.strict_stage_references,
            state: Mutex::new(BoardState {
                store,
                history: TransitionHistory::new(),
                criteria: FilterCriteria::default(),
                sort: SortKey::default(),
                ledger,
                next_seq: 1,
                notices: Vec::new(),
                next_notice_id: 1,
                revision: 0,
            }),
            announcer: Announcer::new(),
            changes,
        })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Move a candidate and wait for the backend to confirm or reject it.
    pub async fn move_candidate(
        &self,
        candidate_id: &CandidateId,
        to_stage: &StageId,
    ) -> Result<MoveOutcome, PipelineError> {
        let pending = match self.begin_move(candidate_id, to_stage)? {
            MoveTicket::Unchanged => return Ok(MoveOutcome::Unchanged),
            MoveTicket::Pending(pending) => pending,
        };

        let result = self.persist(&pending).await;
        Ok(match self.settle(pending, result) {
            Settlement::Confirmed => MoveOutcome::Confirmed,
            Settlement::Superseded => MoveOutcome::Superseded,
            Settlement::Reverted(notice) => MoveOutcome::Failed(notice),
        })
    }

    /// Synchronous half of a move: mutate the store, record history, announce.
    ///
    /// The returned ticket must be handed to [`PipelineEngine::settle`] with the
    /// persistence result.
    pub fn begin_move(
        &self,
        candidate_id: &CandidateId,
        to_stage: &StageId,
    ) -> Result<MoveTicket, PipelineError> {
        self.check_stage(to_stage)?;
        let mut state = self.lock();
        self.apply(&mut state, candidate_id, to_stage.clone(), MoveOrigin::User)
    }

    /// Revert the most recent recorded move through the same optimistic protocol.
    pub async fn undo(&self) -> Result<UndoOutcome, PipelineError> {
        let pending = {
            let mut state = self.lock();
            let Some(entry) = state.history.pop() else {
                return Ok(UndoOutcome::Empty);
            };

            let origin = MoveOrigin::Undo(entry.clone());
            match self.apply(&mut state, &entry.candidate_id, entry.from_stage.clone(), origin) {
                Ok(MoveTicket::Pending(pending)) => pending,
                Ok(MoveTicket::Unchanged) => {
                    state.history.push_redo(entry.clone());
                    return Ok(UndoOutcome::Applied(entry));
                }
                Err(err) => {
                    state.history.restore(entry);
                    return Err(err);
                }
            }
        };

        let result = self.persist(&pending).await;
        let applied = pending.transition.clone();
        Ok(match self.settle(pending, result) {
            Settlement::Confirmed => UndoOutcome::Applied(applied),
            Settlement::Superseded => UndoOutcome::Superseded,
            Settlement::Reverted(notice) => UndoOutcome::Failed(notice),
        })
    }

    /// Re-apply the most recently undone move.
    pub async fn redo(&self) -> Result<UndoOutcome, PipelineError> {
        let pending = {
            let mut state = self.lock();
            let Some(entry) = state.history.pop_redo() else {
                return Ok(UndoOutcome::Empty);
            };

            let origin = MoveOrigin::Redo(entry.clone());
            match self.apply(&mut state, &entry.candidate_id, entry.to_stage.clone(), origin) {
                Ok(MoveTicket::Pending(pending)) => pending,
                Ok(MoveTicket::Unchanged) => {
                    state.history.restore(entry.clone());
                    return Ok(UndoOutcome::Applied(entry));
                }
                Err(err) => {
                    state.history.restore_redo(entry);
                    return Err(err);
                }
            }
        };

        let result = self.persist(&pending).await;
        let applied = pending.transition.clone();
        Ok(match self.settle(pending, result) {
            Settlement::Confirmed => UndoOutcome::Applied(applied),
            Settlement::Superseded => UndoOutcome::Superseded,
            Settlement::Reverted(notice) => UndoOutcome::Failed(notice),
        })
    }

    /// Route a normalized input intent. Gesture feedback only announces; drops move.
    pub async fn dispatch(&self, intent: BoardIntent) -> Result<IntentOutcome, PipelineError> {
        match intent {
            BoardIntent::PickUp { candidate_id } => {
                let (candidate, stage) = self.describe(&candidate_id)?;
                self.announcer
                    .announce(&AnnouncerEvent::PickedUp { candidate, stage });
                Ok(IntentOutcome::Announced)
            }
            BoardIntent::HoverOver {
                candidate_id,
                stage,
            } => {
                self.check_stage(&stage)?;
                let (candidate, _) = self.describe(&candidate_id)?;
                let stage = self.stage_label(&stage);
                self.announcer
                    .announce(&AnnouncerEvent::HoveredOver { candidate, stage });
                Ok(IntentOutcome::Announced)
            }
            BoardIntent::Step {
                candidate_id,
                over,
                direction,
            } => {
                self.check_stage(&over)?;
                let (candidate, _) = self.describe(&candidate_id)?;
                let target = self
                    .registry
                    .neighbour(&over, direction)
                    .map(|stage| stage.id.clone())
                    .unwrap_or(over);
                self.announcer.announce(&AnnouncerEvent::HoveredOver {
                    candidate,
                    stage: self.stage_label(&target),
                });
                Ok(IntentOutcome::Targeted(target))
            }
            BoardIntent::Cancel { candidate_id } => {
                let (candidate, stage) = self.describe(&candidate_id)?;
                self.announcer
                    .announce(&AnnouncerEvent::DropCancelled { candidate, stage });
                Ok(IntentOutcome::Announced)
            }
            BoardIntent::Drop {
                candidate_id,
                stage,
            } => Ok(IntentOutcome::Moved(
                self.move_candidate(&candidate_id, &stage).await?,
            )),
            BoardIntent::Undo => Ok(IntentOutcome::Undo(self.undo().await?)),
            BoardIntent::Redo => Ok(IntentOutcome::Redo(self.redo().await?)),
        }
    }

    /// Apply a persistence result to a pending move.
    ///
    /// Only the newest move for a candidate may confirm or roll back the store. Older
    /// successes still advance the confirmed stage; older failures only remove their own
    /// history entry.
    pub fn settle(&self, pending: PendingMove, result: Result<(), GatewayError>) -> Settlement {
        let PendingMove { transition, origin } = pending;
        let candidate_id = &transition.candidate_id;
        let mut state = self.lock();
        let is_latest = state.ledger.resolve(candidate_id, transition.seq);

        let err = match result {
            Ok(()) => {
                state
                    .ledger
                    .confirm(candidate_id, transition.seq, transition.to_stage.clone());
                if is_latest {
                    debug!(
                        candidate_id = %candidate_id,
                        to_stage = %transition.to_stage,
                        seq = transition.seq,
                        "stage change confirmed"
                    );
                    return Settlement::Confirmed;
                }
                debug!(
                    candidate_id = %candidate_id,
                    seq = transition.seq,
                    "stale confirmation recorded, store left alone"
                );
                return Settlement::Superseded;
            }
            Err(err) if !is_latest => {
                Self::discard_entry(&mut state.history, &transition, &origin);
                debug!(
                    candidate_id = %candidate_id,
                    seq = transition.seq,
                    error = %err,
                    "discarding stale failure"
                );
                return Settlement::Superseded;
            }
            Err(err) => err,
        };

        let restored = state
            .ledger
            .fallback(candidate_id)
            .cloned()
            .unwrap_or_else(|| transition.from_stage.clone());
        if let Err(store_err) = state.store.set_stage(candidate_id, restored.clone()) {
            error!(error = %store_err, "rollback target vanished from the store");
        }

        Self::discard_entry(&mut state.history, &transition, &origin);
        match &origin {
            MoveOrigin::User => {}
            MoveOrigin::Undo(entry) => {
                state.history.restore(entry.clone());
            }
            MoveOrigin::Redo(entry) => {
                state.history.restore_redo(entry.clone());
            }
        }

        let name = Self::candidate_name(&state.store, candidate_id);
        let restored_label = self.stage_label(&restored);
        let to_label = self.stage_label(&transition.to_stage);
        let message = match &origin {
            MoveOrigin::User => format!(
                "Could not move {name} to {to_label} ({err}). Moved back to {restored_label}."
            ),
            MoveOrigin::Undo(_) => format!(
                "Could not undo the move for {name} ({err}). {name} stays in {restored_label}."
            ),
            MoveOrigin::Redo(_) => format!(
                "Could not redo the move for {name} ({err}). {name} stays in {restored_label}."
            ),
        };

        let notice = Notice {
            id: state.next_notice_id,
            kind: origin.notice_kind(),
            candidate_id: candidate_id.clone(),
            message,
        };
        state.next_notice_id += 1;
        state.notices.push(notice.clone());
        if state.notices.len() > NOTICE_CAPACITY {
            let dropped = state.notices.remove(0);
            debug!(notice_id = dropped.id, "notice list full, dropped oldest");
        }

        warn!(
            candidate_id = %candidate_id,
            from_stage = %transition.from_stage,
            to_stage = %transition.to_stage,
            restored_stage = %restored,
            seq = transition.seq,
            error = %err,
            "stage change rejected, rolled back"
        );

        self.publish(&mut state, ChangeReason::Reverted, Some(candidate_id.clone()));
        drop(state);

        self.announcer.announce(&AnnouncerEvent::MoveFailed {
            candidate: name,
            stage: restored_label,
        });

        Settlement::Reverted(notice)
    }

    /// Replace the filter wholesale.
    pub fn set_filter(&self, criteria: FilterCriteria) {
        let mut state = self.lock();
        if state.criteria == criteria {
            return;
        }
        state.criteria = criteria;
        self.publish(&mut state, ChangeReason::FilterChanged, None);
    }

    pub fn set_sort(&self, sort: SortKey) {
        let mut state = self.lock();
        if state.sort == sort {
            return;
        }
        state.sort = sort;
        self.publish(&mut state, ChangeReason::SortChanged, None);
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.lock().criteria.clone()
    }

    pub fn sort_key(&self) -> SortKey {
        self.lock().sort
    }

    /// Filtered and sorted candidates as currently shown by both views.
    pub fn projection(&self) -> Vec<Candidate> {
        let state = self.lock();
        project(state.store.records(), &state.criteria, state.sort)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let state = self.lock();
        let projection = project(state.store.records(), &state.criteria, state.sort)
            .into_iter()
            .cloned()
            .collect();

        PipelineSnapshot {
            revision: state.revision,
            criteria: state.criteria.clone(),
            sort: state.sort,
            projection,
            undo_depth: state.history.depth(),
            redo_depth: state.history.redo_depth(),
            notices: state.notices.clone(),
            announcement: self.announcer.current(),
        }
    }

    pub fn candidate(&self, candidate_id: &CandidateId) -> Option<Candidate> {
        self.lock().store.get(candidate_id).cloned()
    }

    pub fn undo_depth(&self) -> usize {
        self.lock().history.depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.lock().history.redo_depth()
    }

    /// Undo entries, oldest first.
    pub fn history(&self) -> Vec<Transition> {
        self.lock().history.entries().cloned().collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock().notices.clone()
    }

    pub fn dismiss_notice(&self, notice_id: u64) -> bool {
        let mut state = self.lock();
        let before = state.notices.len();
        state.notices.retain(|notice| notice.id != notice_id);
        let removed = state.notices.len() != before;
        if removed {
            self.publish(&mut state, ChangeReason::NoticesChanged, None);
        }
        removed
    }

    pub fn announcement(&self) -> String {
        self.announcer.current()
    }

    pub fn subscribe_announcements(&self) -> watch::Receiver<String> {
        self.announcer.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn apply(
        &self,
        state: &mut BoardState,
        candidate_id: &CandidateId,
        to_stage: StageId,
        origin: MoveOrigin,
    ) -> Result<MoveTicket, PipelineError> {
        let from_stage = state
            .store
            .get(candidate_id)
            .map(|candidate| candidate.stage().clone())
            .ok_or_else(|| PipelineError::UnknownCandidate(candidate_id.clone()))?;

        if from_stage == to_stage {
            return Ok(MoveTicket::Unchanged);
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.store.set_stage(candidate_id, to_stage.clone())?;
        state.ledger.issue(candidate_id, seq, to_stage.clone());

        let transition = Transition {
            candidate_id: candidate_id.clone(),
            from_stage,
            to_stage,
            timestamp: Utc::now(),
            seq,
        };

        let evicted = match &origin {
            MoveOrigin::User => state.history.push(transition.clone()),
            MoveOrigin::Undo(entry) => state.history.push_redo(entry.clone()),
            MoveOrigin::Redo(_) => state.history.push_replayed(transition.clone()),
        };
        if let Some(evicted) = evicted {
            debug!(seq = evicted.seq, "history full, evicted oldest entry");
        }

        debug!(
            candidate_id = %candidate_id,
            from_stage = %transition.from_stage,
            to_stage = %transition.to_stage,
            seq,
            "applied optimistic stage change"
        );

        self.publish(state, ChangeReason::Moved, Some(candidate_id.clone()));

        let candidate = Self::candidate_name(&state.store, candidate_id);
        let event = match &origin {
            MoveOrigin::User => AnnouncerEvent::Dropped {
                candidate,
                from: self.stage_label(&transition.from_stage),
                to: self.stage_label(&transition.to_stage),
            },
            MoveOrigin::Undo(_) => AnnouncerEvent::UndoPerformed {
                candidate,
                stage: self.stage_label(&transition.to_stage),
            },
            MoveOrigin::Redo(_) => AnnouncerEvent::RedoPerformed {
                candidate,
                stage: self.stage_label(&transition.to_stage),
            },
        };
        self.announcer.announce(&event);

        Ok(MoveTicket::Pending(PendingMove { transition, origin }))
    }

    /// Remove the history entry a move created, so a failed move is not undoable.
    fn discard_entry(history: &mut TransitionHistory, transition: &Transition, origin: &MoveOrigin) {
        match origin {
            MoveOrigin::User | MoveOrigin::Redo(_) => {
                history.discard(transition.seq);
            }
            MoveOrigin::Undo(entry) => {
                history.discard_redo(entry.seq);
            }
        }
    }

    async fn persist(&self, pending: &PendingMove) -> Result<(), GatewayError> {
        self.gateway
            .persist_stage_change(pending.candidate_id(), pending.to_stage())
            .await
    }

    fn check_stage(&self, stage: &StageId) -> Result<(), PipelineError> {
        if self.registry.contains(stage) {
            return Ok(());
        }

        error!(stage = %stage, job_id = %self.job_id, "move targets an unregistered stage");
        if self.strict_stage_references {
            panic!("stage `{stage}` is not registered for this pipeline");
        }
        Err(PipelineError::InvalidStageReference(stage.clone()))
    }

    fn describe(&self, candidate_id: &CandidateId) -> Result<(String, String), PipelineError> {
        let state = self.lock();
        let candidate = state
            .store
            .get(candidate_id)
            .ok_or_else(|| PipelineError::UnknownCandidate(candidate_id.clone()))?;
        Ok((
            candidate.candidate_name.clone(),
            self.stage_label(candidate.stage()),
        ))
    }

    fn stage_label(&self, stage: &StageId) -> String {
        self.registry
            .label(stage)
            .map(str::to_string)
            .unwrap_or_else(|| stage.to_string())
    }

    fn candidate_name(store: &CandidateStore, candidate_id: &CandidateId) -> String {
        store
            .get(candidate_id)
            .map(|candidate| candidate.candidate_name.clone())
            .unwrap_or_else(|| candidate_id.to_string())
    }

    fn publish(&self, state: &mut BoardState, reason: ChangeReason, candidate_id: Option<CandidateId>) {
        state.revision += 1;
        let _ = self.changes.send(StoreChange {
            revision: state.revision,
            reason,
            candidate_id,
        });
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
