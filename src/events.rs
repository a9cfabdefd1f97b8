//! Domain event bus.
//!
//! Service mutations publish events over an mpsc channel; a background
//! task consumes and logs them. Downstream consumers (notifications,
//! webhooks) would hang off the same processor.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::EventAction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    EventLogged {
        event_id: Uuid,
        item_id: Uuid,
        action: EventAction,
        quantity: u32,
        new_stock: i64,
    },
    EventEdited {
        event_id: Uuid,
        item_id: Uuid,
        affected_events: usize,
        new_stock: i64,
    },
    EventDeleted {
        event_id: Uuid,
        item_id: Uuid,
        new_stock: i64,
    },
    ItemCreated {
        item_id: Uuid,
    },
    ItemUpdated {
        item_id: Uuid,
    },
    ItemSoftDeleted {
        item_id: Uuid,
    },
    EntityCreated {
        entity_id: Uuid,
    },
    EntityUpdated {
        entity_id: Uuid,
    },
    EntityMovedOut {
        entity_id: Uuid,
    },
    LowStock {
        item_id: Uuid,
        current_stock: i64,
        min_stock: i64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<DomainEvent>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<DomainEvent>) -> Self {
        Self { sender }
    }

    /// Best-effort publish; a full or closed channel is logged, never
    /// surfaced to the mutation that triggered it.
    pub async fn send(&self, event: DomainEvent) {
        if let Err(e) = self.sender.send(event).await {
            warn!("failed to publish domain event: {}", e);
        }
    }
}

/// Consumes the event stream for the lifetime of the process.
pub async fn process_events(mut rx: mpsc::Receiver<DomainEvent>) {
    while let Some(event) = rx.recv().await {
        match &event {
            DomainEvent::LowStock {
                item_id,
                current_stock,
                min_stock,
            } => {
                info!(
                    %item_id,
                    current_stock,
                    min_stock,
                    "item at or below minimum stock"
                );
            }
            other => info!(event = ?other, "domain event"),
        }
    }
    info!("event processor stopped");
}
