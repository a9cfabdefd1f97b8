//! In-memory document store.
//!
//! Ground truth for demo mode and the test suite. Every committed write
//! synchronously emits a fresh full-collection snapshot on the matching
//! broadcast channel, so connected-mode behavior (snapshot push replaces
//! local state) is observable without a network.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{AuditEntry, DocumentStore, StoreError, StoreResult, MAX_BATCH_SIZE};
use crate::models::{Entity, EventAction, Item, PersonRole, StockEvent};

const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

struct Tenant {
    items: RwLock<Vec<Item>>,
    entities: RwLock<Vec<Entity>>,
    events: RwLock<Vec<StockEvent>>,
    audit: RwLock<Vec<AuditEntry>>,
    items_tx: broadcast::Sender<Vec<Item>>,
    entities_tx: broadcast::Sender<Vec<Entity>>,
    events_tx: broadcast::Sender<Vec<StockEvent>>,
}

impl Tenant {
    fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            entities: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            audit: RwLock::new(Vec::new()),
            items_tx: broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY).0,
            entities_tx: broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY).0,
            events_tx: broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY).0,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tenants: Arc<DashMap<String, Arc<Tenant>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tenant(&self, inventory_id: &str) -> Arc<Tenant> {
        self.tenants
            .entry(inventory_id.to_string())
            .or_insert_with(|| Arc::new(Tenant::new()))
            .clone()
    }

    /// Seeds the fixed demo data set for an offline tenant: a few
    /// consumables, one reusable, two residents, and a short ledger.
    pub async fn seed_demo(&self, inventory_id: &str) {
        let tenant = self.tenant(inventory_id);

        let mut toilet_paper = Item::new("Toilet Paper", "🧻");
        toilet_paper.current_stock = 12;
        toilet_paper.min_stock = 5;
        toilet_paper.unit = Some("rolls".into());

        let mut paper_towels = Item::new("Paper Towels", "🧻");
        paper_towels.current_stock = 6;
        paper_towels.min_stock = 3;
        paper_towels.unit = Some("rolls".into());

        let mut dish_soap = Item::new("Dish Soap", "🧴");
        dish_soap.current_stock = 2;
        dish_soap.min_stock = 2;
        dish_soap.unit = Some("bottles".into());

        let mut drill = Item::new("Power Drill", "🔧");
        drill.current_stock = 1;
        drill.reusable = true;

        let mut alex = Entity::person("Alex", "Johnson", PersonRole::Resident);
        alex.room = Some("Room 101".into());
        let mut jordan = Entity::person("Jordan", "Smith", PersonRole::Resident);
        jordan.room = Some("Room 102".into());

        let mut usage = StockEvent::new(
            alex.id,
            alex.display_name(),
            paper_towels.id,
            paper_towels.name.clone(),
            EventAction::Consumed,
            1,
            Utc::now() - chrono::Duration::days(1),
        );
        usage.resulting_stock = Some(paper_towels.current_stock);

        *tenant.items.write().await = vec![toilet_paper, paper_towels, dish_soap, drill];
        *tenant.entities.write().await = vec![alex, jordan];
        *tenant.events.write().await = vec![usage];

        debug!(inventory_id, "demo data seeded");
        let _ = tenant.items_tx.send(tenant.items.read().await.clone());
        let _ = tenant.entities_tx.send(tenant.entities.read().await.clone());
        let _ = tenant.events_tx.send(tenant.events.read().await.clone());
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_items(&self, inventory_id: &str) -> StoreResult<Vec<Item>> {
        Ok(self.tenant(inventory_id).items.read().await.clone())
    }

    async fn upsert_item(&self, inventory_id: &str, item: Item) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        {
            let mut items = tenant.items.write().await;
            match items.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
            items.sort_by(|a, b| a.name.cmp(&b.name));
        }
        let _ = tenant.items_tx.send(tenant.items.read().await.clone());
        Ok(())
    }

    async fn update_item_stock(
        &self,
        inventory_id: &str,
        item_id: Uuid,
        new_stock: i64,
    ) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        {
            let mut items = tenant.items.write().await;
            let item = items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| StoreError::NotFound(format!("item {}", item_id)))?;
            item.current_stock = new_stock;
            item.updated_at = Utc::now();
        }
        let _ = tenant.items_tx.send(tenant.items.read().await.clone());
        Ok(())
    }

    async fn list_entities(&self, inventory_id: &str) -> StoreResult<Vec<Entity>> {
        Ok(self.tenant(inventory_id).entities.read().await.clone())
    }

    async fn upsert_entity(&self, inventory_id: &str, entity: Entity) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        {
            let mut entities = tenant.entities.write().await;
            match entities.iter_mut().find(|e| e.id == entity.id) {
                Some(existing) => *existing = entity,
                None => entities.push(entity),
            }
        }
        let _ = tenant.entities_tx.send(tenant.entities.read().await.clone());
        Ok(())
    }

    async fn list_events(&self, inventory_id: &str) -> StoreResult<Vec<StockEvent>> {
        Ok(self.tenant(inventory_id).events.read().await.clone())
    }

    async fn append_event(&self, inventory_id: &str, event: StockEvent) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        {
            let mut events = tenant.events.write().await;
            events.push(event);
            events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        }
        let _ = tenant.events_tx.send(tenant.events.read().await.clone());
        Ok(())
    }

    async fn update_event(&self, inventory_id: &str, event: StockEvent) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        {
            let mut events = tenant.events.write().await;
            let existing = events
                .iter_mut()
                .find(|e| e.id == event.id)
                .ok_or_else(|| StoreError::NotFound(format!("event {}", event.id)))?;
            *existing = event;
            events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        }
        let _ = tenant.events_tx.send(tenant.events.read().await.clone());
        Ok(())
    }

    async fn delete_event(&self, inventory_id: &str, event_id: Uuid) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        {
            let mut events = tenant.events.write().await;
            let before = events.len();
            events.retain(|e| e.id != event_id);
            if events.len() == before {
                return Err(StoreError::NotFound(format!("event {}", event_id)));
            }
        }
        let _ = tenant.events_tx.send(tenant.events.read().await.clone());
        Ok(())
    }

    async fn update_event_stocks(
        &self,
        inventory_id: &str,
        updates: &[(Uuid, i64)],
    ) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        // sequential chunk commits; a failure mid-way leaves earlier chunks
        // applied, and re-running is safe because the values are absolute
        for chunk in updates.chunks(MAX_BATCH_SIZE) {
            let mut events = tenant.events.write().await;
            for (event_id, resulting_stock) in chunk {
                if let Some(event) = events.iter_mut().find(|e| e.id == *event_id) {
                    event.resulting_stock = Some(*resulting_stock);
                }
            }
        }
        let _ = tenant.events_tx.send(tenant.events.read().await.clone());
        Ok(())
    }

    async fn append_audit(&self, inventory_id: &str, entry: AuditEntry) -> StoreResult<()> {
        let tenant = self.tenant(inventory_id);
        tenant.audit.write().await.push(entry);
        Ok(())
    }

    async fn list_audit(&self, inventory_id: &str) -> StoreResult<Vec<AuditEntry>> {
        let mut entries = self.tenant(inventory_id).audit.read().await.clone();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    fn subscribe_items(&self, inventory_id: &str) -> broadcast::Receiver<Vec<Item>> {
        self.tenant(inventory_id).items_tx.subscribe()
    }

    fn subscribe_entities(&self, inventory_id: &str) -> broadcast::Receiver<Vec<Entity>> {
        self.tenant(inventory_id).entities_tx.subscribe()
    }

    fn subscribe_events(&self, inventory_id: &str) -> broadcast::Receiver<Vec<StockEvent>> {
        self.tenant(inventory_id).events_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_emit_snapshots() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_items("t1");

        store.upsert_item("t1", Item::new("Sponges", "🧽")).await.unwrap();
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Sponges");
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let store = MemoryStore::new();
        store.upsert_item("a", Item::new("Sponges", "🧽")).await.unwrap();
        assert!(store.list_items("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stock_update_on_missing_item_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_item_stock("t1", Uuid::new_v4(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn demo_seed_has_ledger_and_residents() {
        let store = MemoryStore::new();
        store.seed_demo("demo").await;
        assert_eq!(store.list_items("demo").await.unwrap().len(), 4);
        assert_eq!(store.list_entities("demo").await.unwrap().len(), 2);
        assert_eq!(store.list_events("demo").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_updates_replace_whole_collection() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_events("t1");
        let item = Item::new("Sponges", "🧽");
        store.upsert_item("t1", item.clone()).await.unwrap();

        let e1 = StockEvent::new(
            Uuid::new_v4(),
            "Alex Johnson",
            item.id,
            item.name.clone(),
            EventAction::Restocked,
            5,
            Utc::now(),
        );
        store.append_event("t1", e1.clone()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().len(), 1);

        store.delete_event("t1", e1.id).await.unwrap();
        assert!(rx.recv().await.unwrap().is_empty());
    }
}
