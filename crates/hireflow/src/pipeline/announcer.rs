use serde::Serialize;
use tokio::sync::watch;

/// Board events that produce live-region text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnnouncerEvent {
    PickedUp { candidate: String, stage: String },
    HoveredOver { candidate: String, stage: String },
    Dropped { candidate: String, from: String, to: String },
    DropCancelled { candidate: String, stage: String },
    UndoPerformed { candidate: String, stage: String },
    RedoPerformed { candidate: String, stage: String },
    MoveFailed { candidate: String, stage: String },
}

impl AnnouncerEvent {
    pub fn text(&self) -> String {
        match self {
            Self::PickedUp { candidate, stage } => {
                format!("Picked up {candidate} in {stage}.")
            }
            Self::HoveredOver { candidate, stage } => {
                format!("{candidate} is over {stage}.")
            }
            Self::Dropped {
                candidate,
                from,
                to,
            } => format!("Moved {candidate} from {from} to {to}."),
            Self::DropCancelled { candidate, stage } => {
                format!("Move cancelled. {candidate} stays in {stage}.")
            }
            Self::UndoPerformed { candidate, stage } => {
                format!("Undid move. {candidate} is back in {stage}.")
            }
            Self::RedoPerformed { candidate, stage } => {
                format!("Redid move. {candidate} moved to {stage}.")
            }
            Self::MoveFailed { candidate, stage } => {
                format!("Could not move {candidate}. Returned to {stage}.")
            }
        }
    }
}

/// Single always-current announcement slot. Each event overwrites the last.
#[derive(Debug)]
pub struct Announcer {
    slot: watch::Sender<String>,
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new()
    }
}

impl Announcer {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(String::new());
        Self { slot }
    }

    pub fn announce(&self, event: &AnnouncerEvent) {
        self.slot.send_replace(event.text());
    }

    pub fn current(&self) -> String {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.slot.subscribe()
    }
}
