//! Inventory mutation service: the optimistic sync coordinator.
//!
//! One instance serves one inventory tenant. It mirrors the remote
//! collections locally, applies every mutation to the mirror first, then
//! issues the corresponding remote writes and lets the snapshot
//! subscription reconcile. In demo mode the backing store is the local
//! [`MemoryStore`](crate::store::MemoryStore) and the same code path runs
//! with no network, so observable behavior matches connected mode.
//!
//! The event append and the stock-counter update of a logging action are
//! two separate, non-atomic writes; callers tolerate the window where one
//! has landed and the other has not. Remote failures are surfaced to the
//! caller but optimistic local state is not rolled back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{DomainEvent, EventSender};
use crate::models::{
    Entity, EntityKind, EntityStatus, EventAction, Item, Permissions, StockEvent,
};
use crate::services::{ledger, stats};
use crate::store::{AuditEntry, CollectionMirror, DocumentStore};

/// Acting user attributed on events and audit entries. Absent in demo
/// mode.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub uid: String,
    pub display_name: String,
}

/// Fully-formed logging request: consumption, restock, or return.
/// Serialize is needed by the batch request's length validation, which
/// embeds the offending value in its error params.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewEventRequest {
    pub actor_id: Uuid,
    pub item_id: Uuid,
    pub action: EventAction,
    pub quantity: u32,
    /// Defaults to now when absent
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

/// In-place edit of an existing ledger entry.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EventPatch {
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub action: Option<EventAction>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub max_stock: Option<i64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reusable: Option<bool>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EntityPatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub bed_size: Option<String>,
    #[serde(default)]
    pub expected_departure: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

pub struct InventoryService {
    store: Arc<dyn DocumentStore>,
    inventory_id: String,
    permissions: Permissions,
    user: Option<UserContext>,
    items: CollectionMirror<Item>,
    entities: CollectionMirror<Entity>,
    events: CollectionMirror<StockEvent>,
    event_sender: EventSender,
}

impl InventoryService {
    /// Attaches to one inventory tenant. `demo` adopts the store's current
    /// contents as local ground truth; otherwise the mirrors subscribe to
    /// the store's snapshot pushes.
    pub async fn connect(
        store: Arc<dyn DocumentStore>,
        inventory_id: impl Into<String>,
        permissions: Permissions,
        user: Option<UserContext>,
        event_sender: EventSender,
        demo: bool,
    ) -> Result<Self, ServiceError> {
        let inventory_id = inventory_id.into();
        let mut items = CollectionMirror::new("items");
        let mut entities = CollectionMirror::new("entities");
        let mut events = CollectionMirror::new("events");

        // receivers first, then the initial reads: a snapshot pushed in
        // between is buffered rather than missed
        let items_rx = store.subscribe_items(&inventory_id);
        let entities_rx = store.subscribe_entities(&inventory_id);
        let events_rx = store.subscribe_events(&inventory_id);

        let initial_items = store.list_items(&inventory_id).await?;
        let initial_entities = store.list_entities(&inventory_id).await?;
        let initial_events = store.list_events(&inventory_id).await?;

        if demo {
            items.begin_demo(initial_items).await;
            entities.begin_demo(initial_entities).await;
            events.begin_demo(initial_events).await;
            info!(%inventory_id, "inventory service running in demo mode");
        } else {
            items.subscribe(initial_items, items_rx).await;
            entities.subscribe(initial_entities, entities_rx).await;
            events.subscribe(initial_events, events_rx).await;
            info!(%inventory_id, "inventory service subscribed");
        }

        Ok(Self {
            store,
            inventory_id,
            permissions,
            user,
            items,
            entities,
            events,
            event_sender,
        })
    }

    pub fn inventory_id(&self) -> &str {
        &self.inventory_id
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    fn require_edit(&self) -> Result<(), ServiceError> {
        if self.permissions.can_edit {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "edit access required on this inventory".into(),
            ))
        }
    }

    fn require_delete(&self) -> Result<(), ServiceError> {
        if self.permissions.can_delete {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "only the inventory owner can delete".into(),
            ))
        }
    }

    /// Best-effort duplicate of a mutation into the immutable audit trail.
    /// Audit failures are logged and never surfaced to the mutation.
    async fn audit(&self, action: impl Into<String>, details: serde_json::Value) {
        let mut entry = AuditEntry::new(action, details);
        if let Some(user) = &self.user {
            entry.performed_by = Some(user.uid.clone());
            entry.performed_by_name = Some(user.display_name.clone());
        }
        if let Err(e) = self.store.append_audit(&self.inventory_id, entry).await {
            warn!(error = %e, "audit write failed");
        }
    }

    async fn find_item(&self, item_id: Uuid) -> Result<Item, ServiceError> {
        self.items
            .snapshot()
            .await
            .into_iter()
            .find(|i| i.id == item_id && !i.deleted)
            .ok_or_else(|| ServiceError::NotFound(format!("item {}", item_id)))
    }

    async fn find_entity(&self, entity_id: Uuid) -> Result<Entity, ServiceError> {
        self.entities
            .snapshot()
            .await
            .into_iter()
            .find(|e| e.id == entity_id)
            .ok_or_else(|| ServiceError::NotFound(format!("entity {}", entity_id)))
    }

    // ── ledger mutations ────────────────────────────────────────────

    /// Appends one consumption/restock/return event and moves the item's
    /// cached stock counter, optimistically locally and then remotely as
    /// two separate writes.
    #[instrument(skip(self), fields(inventory_id = %self.inventory_id))]
    pub async fn log_event(&self, req: NewEventRequest) -> Result<StockEvent, ServiceError> {
        self.require_edit()?;
        if req.quantity == 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".into(),
            ));
        }

        let item = self.find_item(req.item_id).await?;
        let actor = self.find_entity(req.actor_id).await?;
        if !actor.is_active() {
            return Err(ServiceError::InvalidOperation(format!(
                "{} has moved out and cannot be the actor of a new event",
                actor.display_name()
            )));
        }

        let occurred_at = req.occurred_at.unwrap_or_else(Utc::now);
        let new_stock = ledger::apply_event(item.current_stock, req.action, req.quantity);

        let mut event = StockEvent::new(
            actor.id,
            actor.display_name(),
            item.id,
            item.name.clone(),
            req.action,
            req.quantity,
            occurred_at,
        );
        event.note = req.note.clone();
        event.resulting_stock = Some(new_stock);
        if let Some(user) = &self.user {
            event.recorded_by = Some(user.uid.clone());
            event.recorded_by_name = Some(user.display_name.clone());
        }

        // optimistic local state first
        let optimistic = event.clone();
        self.events
            .apply_local(move |events| {
                events.insert(0, optimistic);
                events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            })
            .await;
        self.items
            .apply_local(move |items| {
                if let Some(i) = items.iter_mut().find(|i| i.id == req.item_id) {
                    i.current_stock = new_stock;
                    i.updated_at = Utc::now();
                }
            })
            .await;

        // two separate, non-atomic remote writes; a failure between them
        // leaves the accepted drift window described in the module docs
        self.store
            .append_event(&self.inventory_id, event.clone())
            .await?;
        self.store
            .update_item_stock(&self.inventory_id, item.id, new_stock)
            .await?;

        self.audit(
            format!("log-{}", req.action),
            json!({
                "event_id": event.id,
                "actor_name": event.actor_name,
                "item_name": event.item_name,
                "quantity": event.quantity,
                "new_stock": new_stock,
            }),
        )
        .await;
        self.audit(
            "stock-updated",
            json!({
                "item_id": item.id,
                "item_name": item.name,
                "action": req.action.to_string(),
                "new_stock": new_stock,
            }),
        )
        .await;

        self.event_sender
            .send(DomainEvent::EventLogged {
                event_id: event.id,
                item_id: item.id,
                action: req.action,
                quantity: req.quantity,
                new_stock,
            })
            .await;
        if req.action == EventAction::Consumed && new_stock <= item.min_stock {
            self.event_sender
                .send(DomainEvent::LowStock {
                    item_id: item.id,
                    current_stock: new_stock,
                    min_stock: item.min_stock,
                })
                .await;
        }

        Ok(event)
    }

    /// Restock flow; same ledger path as any other logging action.
    pub async fn restock_item(
        &self,
        item_id: Uuid,
        actor_id: Uuid,
        quantity: u32,
        occurred_at: Option<DateTime<Utc>>,
        note: Option<String>,
    ) -> Result<StockEvent, ServiceError> {
        self.log_event(NewEventRequest {
            actor_id,
            item_id,
            action: EventAction::Restocked,
            quantity,
            occurred_at,
            note,
        })
        .await
    }

    /// Logs several events one after the other. Deliberately sequential:
    /// serializing the awaits keeps the per-item stock updates within one
    /// user action from racing each other.
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn log_events_batch(
        &self,
        requests: Vec<NewEventRequest>,
    ) -> Result<Vec<StockEvent>, ServiceError> {
        let mut logged = Vec::with_capacity(requests.len());
        for request in requests {
            logged.push(self.log_event(request).await?);
        }
        Ok(logged)
    }

    /// Edits a ledger entry in place and replays the item's timeline.
    ///
    /// The replay reverses the old delta, applies the new one, and
    /// refreshes the `resulting_stock` snapshot of every subsequent event;
    /// applying only the new effect without the reversal would corrupt the
    /// stock counter.
    #[instrument(skip(self, patch), fields(inventory_id = %self.inventory_id))]
    pub async fn update_event(
        &self,
        event_id: Uuid,
        patch: EventPatch,
    ) -> Result<StockEvent, ServiceError> {
        self.require_edit()?;

        let events = self.events.snapshot().await;
        let original = events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("event {}", event_id)))?;

        let mut updated = original.clone();
        if let Some(quantity) = patch.quantity {
            if quantity == 0 {
                return Err(ServiceError::ValidationError(
                    "quantity must be at least 1".into(),
                ));
            }
            updated.quantity = quantity;
        }
        if let Some(action) = patch.action {
            updated.action = action;
        }
        if let Some(occurred_at) = patch.occurred_at {
            updated.occurred_at = occurred_at;
        }
        if let Some(actor_id) = patch.actor_id {
            let actor = self.find_entity(actor_id).await?;
            updated.actor_id = actor.id;
            updated.actor_name = actor.display_name();
        }
        if let Some(note) = patch.note {
            updated.note = Some(note);
        }

        // replay the item's timeline with the edited event substituted
        let mut item_events: Vec<StockEvent> = events
            .iter()
            .filter(|e| e.item_id == original.item_id)
            .cloned()
            .collect();
        for e in &mut item_events {
            if e.id == event_id {
                *e = updated.clone();
            }
        }
        let replay = ledger::replay_timeline(&item_events);
        updated.resulting_stock = replay
            .snapshots
            .iter()
            .find(|s| s.event_id == event_id)
            .map(|s| s.resulting_stock);
        let new_stock = replay.final_stock;
        let affected_events = replay.snapshots.len();

        // optimistic local state
        {
            let updated = updated.clone();
            let snapshots = replay.snapshots.clone();
            self.events
                .apply_local(move |events| {
                    for e in events.iter_mut() {
                        if e.id == event_id {
                            *e = updated.clone();
                        } else if let Some(s) =
                            snapshots.iter().find(|s| s.event_id == e.id)
                        {
                            e.resulting_stock = Some(s.resulting_stock);
                        }
                    }
                    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
                })
                .await;
        }
        let item_id = original.item_id;
        self.items
            .apply_local(move |items| {
                if let Some(i) = items.iter_mut().find(|i| i.id == item_id) {
                    i.current_stock = new_stock;
                    i.updated_at = Utc::now();
                }
            })
            .await;

        // remote: edited document, snapshot batch, then the counter
        self.store
            .update_event(&self.inventory_id, updated.clone())
            .await?;
        let snapshot_updates: Vec<(Uuid, i64)> = replay
            .snapshots
            .iter()
            .filter(|s| s.event_id != event_id)
            .map(|s| (s.event_id, s.resulting_stock))
            .collect();
        self.store
            .update_event_stocks(&self.inventory_id, &snapshot_updates)
            .await?;
        self.store
            .update_item_stock(&self.inventory_id, item_id, new_stock)
            .await?;

        self.audit(
            "usage-log-edited",
            json!({
                "event_id": event_id,
                "item_name": original.item_name,
                "original_quantity": original.quantity,
                "new_quantity": updated.quantity,
                "original_action": original.action.to_string(),
                "new_action": updated.action.to_string(),
                "affected_events": affected_events,
            }),
        )
        .await;

        self.event_sender
            .send(DomainEvent::EventEdited {
                event_id,
                item_id,
                affected_events,
                new_stock,
            })
            .await;

        Ok(updated)
    }

    /// Deletes a ledger entry and reverses its stock effect.
    #[instrument(skip(self), fields(inventory_id = %self.inventory_id))]
    pub async fn delete_event(&self, event_id: Uuid) -> Result<(), ServiceError> {
        self.require_delete()?;

        let event = self
            .events
            .snapshot()
            .await
            .into_iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| ServiceError::NotFound(format!("event {}", event_id)))?;

        // the item may have been soft-deleted since the event was logged;
        // the log entry goes away regardless, and the reversal applies to
        // whatever counter still exists
        let item = self
            .items
            .snapshot()
            .await
            .into_iter()
            .find(|i| i.id == event.item_id);
        let reversed = item.map(|item| {
            (
                item.id,
                ledger::reverse_event(item.current_stock, event.action, event.quantity),
            )
        });

        self.events
            .apply_local(move |events| events.retain(|e| e.id != event_id))
            .await;
        if let Some((item_id, new_stock)) = reversed {
            self.items
                .apply_local(move |items| {
                    if let Some(i) = items.iter_mut().find(|i| i.id == item_id) {
                        i.current_stock = new_stock;
                        i.updated_at = Utc::now();
                    }
                })
                .await;
        }

        self.store.delete_event(&self.inventory_id, event_id).await?;
        if let Some((item_id, new_stock)) = reversed {
            self.store
                .update_item_stock(&self.inventory_id, item_id, new_stock)
                .await?;
        }

        self.audit(
            "usage-log-deleted",
            json!({
                "event_id": event_id,
                "item_name": event.item_name,
                "actor_name": event.actor_name,
                "quantity": event.quantity,
                "stock_restored_to": reversed.map(|(_, new_stock)| new_stock),
            }),
        )
        .await;

        if let Some((item_id, new_stock)) = reversed {
            self.event_sender
                .send(DomainEvent::EventDeleted {
                    event_id,
                    item_id,
                    new_stock,
                })
                .await;
        }

        Ok(())
    }

    // ── item management ─────────────────────────────────────────────

    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        name: String,
        icon: String,
        reusable: bool,
    ) -> Result<Item, ServiceError> {
        self.require_edit()?;
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError("item name is required".into()));
        }

        let mut item = Item::new(name.trim(), icon);
        item.reusable = reusable;

        let optimistic = item.clone();
        self.items
            .apply_local(move |items| {
                items.push(optimistic);
                items.sort_by(|a, b| a.name.cmp(&b.name));
            })
            .await;
        self.store
            .upsert_item(&self.inventory_id, item.clone())
            .await?;

        self.audit(
            "created-item",
            json!({ "item_id": item.id, "item_name": item.name, "icon": item.icon }),
        )
        .await;
        self.event_sender
            .send(DomainEvent::ItemCreated { item_id: item.id })
            .await;
        Ok(item)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_item(&self, item_id: Uuid, patch: ItemPatch) -> Result<Item, ServiceError> {
        self.require_edit()?;
        let mut item = self.find_item(item_id).await?;

        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(icon) = patch.icon {
            item.icon = icon;
        }
        if let Some(min_stock) = patch.min_stock {
            item.min_stock = min_stock;
        }
        if let Some(max_stock) = patch.max_stock {
            item.max_stock = Some(max_stock);
        }
        if let Some(unit) = patch.unit {
            item.unit = Some(unit);
        }
        if let Some(reusable) = patch.reusable {
            item.reusable = reusable;
        }
        if let Some(hidden) = patch.hidden {
            item.hidden = hidden;
        }
        if let Some(tags) = patch.tags {
            item.tags = tags;
        }
        if let Some(notes) = patch.notes {
            item.notes = Some(notes);
        }
        item.updated_at = Utc::now();

        let optimistic = item.clone();
        self.items
            .apply_local(move |items| {
                if let Some(i) = items.iter_mut().find(|i| i.id == item_id) {
                    *i = optimistic;
                }
                items.sort_by(|a, b| a.name.cmp(&b.name));
            })
            .await;
        self.store
            .upsert_item(&self.inventory_id, item.clone())
            .await?;

        self.audit(
            "updated-item",
            json!({ "item_id": item.id, "item_name": item.name }),
        )
        .await;
        self.event_sender
            .send(DomainEvent::ItemUpdated { item_id })
            .await;
        Ok(item)
    }

    /// Soft delete: the item stays in the store so old events keep a valid
    /// reference.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        self.require_delete()?;
        let mut item = self.find_item(item_id).await?;
        item.deleted = true;
        item.deleted_at = Some(Utc::now());
        item.updated_at = Utc::now();

        let optimistic = item.clone();
        self.items
            .apply_local(move |items| {
                if let Some(i) = items.iter_mut().find(|i| i.id == item_id) {
                    *i = optimistic;
                }
            })
            .await;
        self.store
            .upsert_item(&self.inventory_id, item.clone())
            .await?;

        self.audit(
            "deleted-item",
            json!({ "item_id": item.id, "item_name": item.name }),
        )
        .await;
        self.event_sender
            .send(DomainEvent::ItemSoftDeleted { item_id })
            .await;
        Ok(())
    }

    // ── entity management ───────────────────────────────────────────

    #[instrument(skip(self, entity), fields(entity_id = %entity.id))]
    pub async fn add_entity(&self, entity: Entity) -> Result<Entity, ServiceError> {
        self.require_edit()?;
        if entity.display_name().is_empty() {
            return Err(ServiceError::ValidationError(
                "entity name is required".into(),
            ));
        }

        let optimistic = entity.clone();
        self.entities
            .apply_local(move |entities| entities.push(optimistic))
            .await;
        self.store
            .upsert_entity(&self.inventory_id, entity.clone())
            .await?;

        self.audit(
            "entity-added",
            json!({ "entity_id": entity.id, "entity_name": entity.display_name() }),
        )
        .await;
        self.event_sender
            .send(DomainEvent::EntityCreated {
                entity_id: entity.id,
            })
            .await;
        Ok(entity)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_entity(
        &self,
        entity_id: Uuid,
        patch: EntityPatch,
    ) -> Result<Entity, ServiceError> {
        self.require_edit()?;
        let mut entity = self.find_entity(entity_id).await?;

        match &mut entity.kind {
            EntityKind::Person {
                first_name,
                last_name,
                expected_departure,
                ..
            } => {
                if let Some(name) = patch.first_name {
                    *first_name = name;
                }
                if let Some(name) = patch.last_name {
                    *last_name = name;
                }
                if let Some(date) = patch.expected_departure {
                    *expected_departure = Some(date);
                }
            }
            EntityKind::Location {
                display_name,
                bed_size,
                ..
            } => {
                if let Some(name) = patch.display_name {
                    *display_name = name;
                }
                if let Some(size) = patch.bed_size {
                    *bed_size = Some(size);
                }
            }
        }
        if let Some(room) = patch.room {
            entity.room = Some(room);
        }
        if let Some(tags) = patch.tags {
            entity.tags = tags;
        }
        entity.updated_at = Utc::now();

        let optimistic = entity.clone();
        self.entities
            .apply_local(move |entities| {
                if let Some(e) = entities.iter_mut().find(|e| e.id == entity_id) {
                    *e = optimistic;
                }
            })
            .await;
        self.store
            .upsert_entity(&self.inventory_id, entity.clone())
            .await?;

        self.audit(
            "entity-updated",
            json!({ "entity_id": entity.id, "entity_name": entity.display_name() }),
        )
        .await;
        self.event_sender
            .send(DomainEvent::EntityUpdated { entity_id })
            .await;
        Ok(entity)
    }

    /// `Active -> MovedOut`. The entity keeps its full event history and
    /// is excluded from active listings and actor pickers.
    #[instrument(skip(self))]
    pub async fn move_out(
        &self,
        entity_id: Uuid,
        moved_out_at: Option<DateTime<Utc>>,
    ) -> Result<Entity, ServiceError> {
        self.require_edit()?;
        let mut entity = self.find_entity(entity_id).await?;
        entity.status = EntityStatus::MovedOut;
        entity.moved_out_at = Some(moved_out_at.unwrap_or_else(Utc::now));
        entity.updated_at = Utc::now();
        self.persist_status_change(
            entity,
            "entity-moved-out",
            DomainEvent::EntityMovedOut { entity_id },
        )
        .await
    }

    /// `MovedOut -> Active`.
    #[instrument(skip(self))]
    pub async fn reactivate(&self, entity_id: Uuid) -> Result<Entity, ServiceError> {
        self.require_edit()?;
        let mut entity = self.find_entity(entity_id).await?;
        entity.status = EntityStatus::Active;
        entity.moved_out_at = None;
        entity.updated_at = Utc::now();
        self.persist_status_change(
            entity,
            "entity-reactivated",
            DomainEvent::EntityUpdated { entity_id },
        )
        .await
    }

    async fn persist_status_change(
        &self,
        entity: Entity,
        audit_action: &str,
        domain_event: DomainEvent,
    ) -> Result<Entity, ServiceError> {
        let entity_id = entity.id;
        let optimistic = entity.clone();
        self.entities
            .apply_local(move |entities| {
                if let Some(e) = entities.iter_mut().find(|e| e.id == entity_id) {
                    *e = optimistic;
                }
            })
            .await;
        self.store
            .upsert_entity(&self.inventory_id, entity.clone())
            .await?;

        self.audit(
            audit_action,
            json!({ "entity_id": entity.id, "entity_name": entity.display_name() }),
        )
        .await;
        self.event_sender.send(domain_event).await;
        Ok(entity)
    }

    // ── read side ───────────────────────────────────────────────────

    /// Items for default views: not deleted, and not hidden unless asked.
    pub async fn items(&self, include_hidden: bool) -> Vec<Item> {
        self.items
            .snapshot()
            .await
            .into_iter()
            .filter(|i| !i.deleted && (include_hidden || !i.hidden))
            .collect()
    }

    pub async fn entities(&self, include_moved_out: bool) -> Vec<Entity> {
        self.entities
            .snapshot()
            .await
            .into_iter()
            .filter(|e| include_moved_out || e.is_active())
            .collect()
    }

    pub async fn events(&self, limit: Option<usize>) -> Vec<StockEvent> {
        let mut events = self.events.snapshot().await;
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        if let Some(limit) = limit {
            events.truncate(limit);
        }
        events
    }

    pub async fn events_for_item(&self, item_id: Uuid) -> Vec<StockEvent> {
        self.events
            .snapshot()
            .await
            .into_iter()
            .filter(|e| e.item_id == item_id)
            .collect()
    }

    pub async fn events_for_actor(&self, actor_id: Uuid) -> Vec<StockEvent> {
        self.events
            .snapshot()
            .await
            .into_iter()
            .filter(|e| e.actor_id == actor_id)
            .collect()
    }

    pub async fn audit_trail(&self) -> Result<Vec<AuditEntry>, ServiceError> {
        Ok(self.store.list_audit(&self.inventory_id).await?)
    }

    // ── derived statistics ──────────────────────────────────────────

    pub async fn item_statistics(
        &self,
        item_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<stats::ItemStatistics>, ServiceError> {
        let item = self.find_item(item_id).await?;
        let events = self.events_for_item(item_id).await;
        Ok(stats::compute_item_statistics(&events, &item, now))
    }

    pub async fn entity_statistics(
        &self,
        entity_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<stats::EntityStatistics>, ServiceError> {
        let entity = self.find_entity(entity_id).await?;
        let events = self.events_for_actor(entity_id).await;
        Ok(stats::compute_entity_statistics(&events, &entity, now))
    }

    pub async fn held_reusables(
        &self,
        entity_id: Uuid,
    ) -> Result<Vec<stats::HeldItem>, ServiceError> {
        self.find_entity(entity_id).await?;
        let events = self.events_for_actor(entity_id).await;
        let items = self.items.snapshot().await;
        Ok(stats::compute_held_reusables(&events, &items))
    }
}
