//! Document-store seam.
//!
//! The hosted document database behind the original system is an external
//! collaborator; everything this crate needs from it sits behind
//! [`DocumentStore`]. The in-process [`memory::MemoryStore`] is the demo
//! and test implementation; a remote backend plugs in at the same trait.
//!
//! Subscriptions deliver full collection snapshots, and a pushed snapshot
//! unconditionally replaces local state: the server's view always wins
//! over an optimistic local mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Entity, Item, StockEvent};

pub mod memory;
pub mod mirror;

pub use memory::MemoryStore;
pub use mirror::{CollectionMirror, MirrorState};

/// Remote backends cap batched writes; larger update sets are chunked into
/// sequentially committed batches of this size.
pub const MAX_BATCH_SIZE: usize = 500;

/// Immutable audit-trail record duplicated alongside every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by_name: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: action.into(),
            performed_by: None,
            performed_by_name: None,
            date: Utc::now(),
            details,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected: {0}")]
    WriteFailed(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            other => ServiceError::StoreError(other.to_string()),
        }
    }
}

/// Per-tenant persistence operations over items, entities, the event log,
/// and the audit trail.
///
/// There is deliberately no multi-document transaction here: the event
/// append and the stock-counter update of a logging action are two
/// separate writes, and callers tolerate the window between them. Ledger
/// edits batch their snapshot rewrites through
/// [`DocumentStore::update_event_stocks`], chunked at [`MAX_BATCH_SIZE`]
/// with sequential commits and accepted partial completion.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // items
    async fn list_items(&self, inventory_id: &str) -> StoreResult<Vec<Item>>;
    async fn upsert_item(&self, inventory_id: &str, item: Item) -> StoreResult<()>;
    async fn update_item_stock(
        &self,
        inventory_id: &str,
        item_id: Uuid,
        new_stock: i64,
    ) -> StoreResult<()>;

    // entities
    async fn list_entities(&self, inventory_id: &str) -> StoreResult<Vec<Entity>>;
    async fn upsert_entity(&self, inventory_id: &str, entity: Entity) -> StoreResult<()>;

    // event log
    async fn list_events(&self, inventory_id: &str) -> StoreResult<Vec<StockEvent>>;
    async fn append_event(&self, inventory_id: &str, event: StockEvent) -> StoreResult<()>;
    async fn update_event(&self, inventory_id: &str, event: StockEvent) -> StoreResult<()>;
    async fn delete_event(&self, inventory_id: &str, event_id: Uuid) -> StoreResult<()>;
    /// Rewrites `resulting_stock` snapshots for many events, in chunks.
    async fn update_event_stocks(
        &self,
        inventory_id: &str,
        updates: &[(Uuid, i64)],
    ) -> StoreResult<()>;

    // audit trail (append-only)
    async fn append_audit(&self, inventory_id: &str, entry: AuditEntry) -> StoreResult<()>;
    async fn list_audit(&self, inventory_id: &str) -> StoreResult<Vec<AuditEntry>>;

    // real-time snapshot subscriptions
    fn subscribe_items(&self, inventory_id: &str) -> broadcast::Receiver<Vec<Item>>;
    fn subscribe_entities(&self, inventory_id: &str) -> broadcast::Receiver<Vec<Entity>>;
    fn subscribe_events(&self, inventory_id: &str) -> broadcast::Receiver<Vec<StockEvent>>;
}
