use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{LedgerSummary, PersonId, Verdict};

/// Facts published after a mutation settles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    VerificationCompleted {
        person_id: PersonId,
        date: NaiveDate,
        verdict: Verdict,
    },
    LedgerChanged {
        person_id: PersonId,
        previous_used: f64,
        ledger: LedgerSummary,
    },
}

/// In-process broadcast of [`DomainEvent`]s. Publishing never blocks and
/// succeeds with no subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: DomainEvent) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
