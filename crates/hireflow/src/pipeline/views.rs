use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::Candidate;
use super::stages::{StageId, StageRegistry};

/// Which presentation consumes the projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    List,
    Kanban,
}

/// Flat table rows in projection order.
#[derive(Debug, Clone, Serialize)]
pub struct ListView<'a> {
    pub rows: Vec<&'a Candidate>,
}

impl<'a> ListView<'a> {
    pub fn from_projection(projection: &[&'a Candidate]) -> Self {
        Self {
            rows: projection.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn<'a> {
    pub stage: StageId,
    pub label: &'a str,
    pub terminal: bool,
    pub count: usize,
    pub cards: Vec<&'a Candidate>,
}

/// Projection partitioned into one column per registered stage.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanBoard<'a> {
    pub columns: Vec<KanbanColumn<'a>>,
}

impl<'a> KanbanBoard<'a> {
    /// Single grouping pass; cards keep projection order inside each column and every
    /// registered stage gets a column, empty or not.
    pub fn from_projection(projection: &[&'a Candidate], registry: &'a StageRegistry) -> Self {
        let mut grouped: HashMap<&StageId, Vec<&'a Candidate>> = HashMap::new();
        for &candidate in projection {
            grouped.entry(candidate.stage()).or_default().push(candidate);
        }

        let columns = registry
            .stages()
            .iter()
            .map(|stage| {
                let cards = grouped.remove(&stage.id).unwrap_or_default();
                KanbanColumn {
                    stage: stage.id.clone(),
                    label: stage.label.as_str(),
                    terminal: stage.terminal,
                    count: cards.len(),
                    cards,
                }
            })
            .collect();

        Self { columns }
    }

    pub fn column(&self, stage: &StageId) -> Option<&KanbanColumn<'a>> {
        self.columns.iter().find(|column| &column.stage == stage)
    }
}

/// Either presentation, built from the same projection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum BoardView<'a> {
    List(ListView<'a>),
    Kanban(KanbanBoard<'a>),
}

impl<'a> BoardView<'a> {
    pub fn render(
        projection: &[&'a Candidate],
        registry: &'a StageRegistry,
        mode: ViewMode,
    ) -> Self {
        match mode {
            ViewMode::List => Self::List(ListView::from_projection(projection)),
            ViewMode::Kanban => Self::Kanban(KanbanBoard::from_projection(projection, registry)),
        }
    }

    /// Candidate ids visible in this view, in render order.
    pub fn visible_ids(&self) -> Vec<&'a str> {
        match self {
            Self::List(list) => list.rows.iter().copied().map(|c| c.id.0.as_str()).collect(),
            Self::Kanban(board) => board
                .columns
                .iter()
                .flat_map(|column| column.cards.iter().copied().map(|c| c.id.0.as_str()))
                .collect(),
        }
    }
}
