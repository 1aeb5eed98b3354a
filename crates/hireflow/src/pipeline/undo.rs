use std::collections::VecDeque;

use super::domain::Transition;

/// Maximum number of entries kept for undo (and, separately, for redo).
pub const UNDO_CAPACITY: usize = 10;

/// Push-ordered stack that drops its oldest entry once full.
#[derive(Debug, Clone)]
struct BoundedStack {
    entries: VecDeque<Transition>,
    capacity: usize,
}

impl BoundedStack {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, transition: Transition) -> Option<Transition> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(transition);
        evicted
    }

    fn pop(&mut self) -> Option<Transition> {
        self.entries.pop_back()
    }

    fn remove(&mut self, seq: u64) -> Option<Transition> {
        let position = self.entries.iter().position(|entry| entry.seq == seq)?;
        self.entries.remove(position)
    }

    /// Reinsert at its chronological slot. An entry older than everything in a full stack
    /// is the one eviction would drop, so it stays gone.
    fn restore(&mut self, transition: Transition) -> bool {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.seq > transition.seq)
            .unwrap_or(self.entries.len());

        if self.entries.len() >= self.capacity {
            if position == 0 {
                return false;
            }
            self.entries.pop_front();
            self.entries.insert(position - 1, transition);
        } else {
            self.entries.insert(position, transition);
        }
        true
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Undo and redo lists for board transitions.
#[derive(Debug, Clone)]
pub struct TransitionHistory {
    undo: BoundedStack,
    redo: BoundedStack,
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionHistory {
    pub fn new() -> Self {
        Self {
            undo: BoundedStack::new(UNDO_CAPACITY),
            redo: BoundedStack::new(UNDO_CAPACITY),
        }
    }

    /// Record a fresh user move. Returns the evicted oldest entry, if any.
    pub fn push(&mut self, transition: Transition) -> Option<Transition> {
        self.redo.entries.clear();
        self.undo.push(transition)
    }

    pub fn pop(&mut self) -> Option<Transition> {
        self.undo.pop()
    }

    /// Drop the entry created by a move whose persistence failed.
    pub fn discard(&mut self, seq: u64) -> Option<Transition> {
        self.undo.remove(seq)
    }

    pub fn restore(&mut self, transition: Transition) -> bool {
        self.undo.restore(transition)
    }

    /// Push without clearing redo; used when a redo lands back on the undo list.
    pub(crate) fn push_replayed(&mut self, transition: Transition) -> Option<Transition> {
        self.undo.push(transition)
    }

    pub fn push_redo(&mut self, transition: Transition) -> Option<Transition> {
        self.redo.push(transition)
    }

    pub fn pop_redo(&mut self) -> Option<Transition> {
        self.redo.pop()
    }

    pub fn discard_redo(&mut self, seq: u64) -> Option<Transition> {
        self.redo.remove(seq)
    }

    pub fn restore_redo(&mut self, transition: Transition) -> bool {
        self.redo.restore(transition)
    }

    pub fn depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Undo entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &Transition> {
        self.undo.entries.iter()
    }
}
