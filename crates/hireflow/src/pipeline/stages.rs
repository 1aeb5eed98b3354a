use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::intent::KeyboardDirection;
use super::PipelineError;

/// Identifier of a hiring stage such as `new` or `hired`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub String);

impl StageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One column of the hiring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: StageId,
    pub label: String,
    pub position: usize,
    pub terminal: bool,
}

/// Ordered, fixed set of stages for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<Stage>,
}

impl StageRegistry {
    /// Build a registry from `(id, label, terminal)` triples in column order.
    pub fn new<I, S, L>(entries: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (S, L, bool)>,
        S: Into<String>,
        L: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut stages = Vec::new();

        for (position, (id, label, terminal)) in entries.into_iter().enumerate() {
            let id = StageId(id.into());
            if !seen.insert(id.clone()) {
                return Err(PipelineError::DuplicateStage(id));
            }
            stages.push(Stage {
                id,
                label: label.into(),
                position,
                terminal,
            });
        }

        if stages.is_empty() {
            return Err(PipelineError::EmptyRegistry);
        }

        Ok(Self { stages })
    }

    /// The default hiring flow, New through Hired/Rejected.
    pub fn standard() -> Self {
        let stages = [
            ("new", "New", false),
            ("reviewing", "Reviewing", false),
            ("interviewing", "Interviewing", false),
            ("offered", "Offer", false),
            ("hired", "Hired", true),
            ("rejected", "Rejected", true),
        ]
        .into_iter()
        .enumerate()
        .map(|(position, (id, label, terminal))| Stage {
            id: StageId::from(id),
            label: label.to_string(),
            position,
            terminal,
        })
        .collect();

        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn get(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| &stage.id == id)
    }

    pub fn contains(&self, id: &StageId) -> bool {
        self.get(id).is_some()
    }

    pub fn label(&self, id: &StageId) -> Option<&str> {
        self.get(id).map(|stage| stage.label.as_str())
    }

    /// Adjacent column for keyboard moves; `None` at either edge or for unknown ids.
    pub fn neighbour(&self, id: &StageId, direction: KeyboardDirection) -> Option<&Stage> {
        let position = self.get(id)?.position;
        match direction {
            KeyboardDirection::Previous => position
                .checked_sub(1)
                .and_then(|prev| self.stages.get(prev)),
            KeyboardDirection::Next => self.stages.get(position + 1),
        }
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
