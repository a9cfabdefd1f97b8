//! End-to-end ledger scenarios through the inventory service: logging,
//! editing with timeline replay, deletion with reversal, and the
//! permission gates around each mutation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use housestock_api::errors::ServiceError;
use housestock_api::events::EventSender;
use housestock_api::models::{Entity, EventAction, Permissions, PersonRole};
use housestock_api::services::{EventPatch, InventoryService, NewEventRequest};
use housestock_api::store::{DocumentStore, MemoryStore};

async fn demo_service_with(permissions: Permissions) -> InventoryService {
    let store = Arc::new(MemoryStore::new());
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    InventoryService::connect(
        store,
        "test-house",
        permissions,
        None,
        EventSender::new(tx),
        true,
    )
    .await
    .expect("service should connect")
}

async fn demo_service() -> InventoryService {
    demo_service_with(Permissions::full()).await
}

struct Fixture {
    service: InventoryService,
    actor_id: Uuid,
    item_id: Uuid,
}

/// Paper Towels brought to stock 6 via an opening restock.
async fn paper_towels_fixture() -> Fixture {
    let service = demo_service().await;
    let actor = service
        .add_entity(Entity::person("Jordan", "Smith", PersonRole::Resident))
        .await
        .unwrap();
    let item = service
        .add_item("Paper Towels".into(), "🧻".into(), false)
        .await
        .unwrap();
    service
        .restock_item(
            item.id,
            actor.id,
            6,
            Some(Utc::now() - Duration::hours(6)),
            None,
        )
        .await
        .unwrap();
    Fixture {
        service,
        actor_id: actor.id,
        item_id: item.id,
    }
}

async fn current_stock(service: &InventoryService, item_id: Uuid) -> i64 {
    service
        .items(true)
        .await
        .into_iter()
        .find(|i| i.id == item_id)
        .expect("item should exist")
        .current_stock
}

#[tokio::test]
async fn consumption_and_restock_move_the_cached_stock() {
    let fx = paper_towels_fixture().await;

    fx.service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 2,
            occurred_at: Some(Utc::now() - Duration::hours(4)),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 4);

    let restock = fx
        .service
        .restock_item(
            fx.item_id,
            fx.actor_id,
            10,
            Some(Utc::now() - Duration::hours(2)),
            None,
        )
        .await
        .unwrap();
    assert_eq!(restock.resulting_stock, Some(14));
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 14);
}

#[tokio::test]
async fn consumption_clamps_at_zero() {
    let fx = paper_towels_fixture().await;

    let event = fx
        .service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 99,
            occurred_at: None,
            note: None,
        })
        .await
        .unwrap();

    assert_eq!(event.resulting_stock, Some(0));
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 0);
}

#[tokio::test]
async fn editing_a_past_event_replays_the_timeline() {
    let fx = paper_towels_fixture().await;

    let consume = fx
        .service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 2,
            occurred_at: Some(Utc::now() - Duration::hours(4)),
            note: None,
        })
        .await
        .unwrap();
    let restock = fx
        .service
        .restock_item(
            fx.item_id,
            fx.actor_id,
            10,
            Some(Utc::now() - Duration::hours(2)),
            None,
        )
        .await
        .unwrap();
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 14);

    // 6 - 5 + 10 = 11 once the consumption is bumped from 2 to 5
    let edited = fx
        .service
        .update_event(
            consume.id,
            EventPatch {
                quantity: Some(5),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.quantity, 5);
    assert_eq!(edited.resulting_stock, Some(1));
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 11);

    // the later restock's snapshot was rewritten by the replay
    let events = fx.service.events_for_item(fx.item_id).await;
    let replayed_restock = events.iter().find(|e| e.id == restock.id).unwrap();
    assert_eq!(replayed_restock.resulting_stock, Some(11));
}

#[tokio::test]
async fn changing_an_events_action_flips_its_effect() {
    let fx = paper_towels_fixture().await;

    let event = fx
        .service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 2,
            occurred_at: Some(Utc::now() - Duration::hours(1)),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 4);

    // consumed -> restocked swings the stock by twice the quantity
    fx.service
        .update_event(
            event.id,
            EventPatch {
                action: Some(EventAction::Restocked),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 8);
}

#[tokio::test]
async fn deleting_an_event_reverses_its_effect() {
    let fx = paper_towels_fixture().await;

    fx.service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 2,
            occurred_at: Some(Utc::now() - Duration::hours(4)),
            note: None,
        })
        .await
        .unwrap();
    let restock = fx
        .service
        .restock_item(
            fx.item_id,
            fx.actor_id,
            10,
            Some(Utc::now() - Duration::hours(2)),
            None,
        )
        .await
        .unwrap();
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 14);

    fx.service.delete_event(restock.id).await.unwrap();

    assert_eq!(current_stock(&fx.service, fx.item_id).await, 4);
    let events = fx.service.events_for_item(fx.item_id).await;
    assert!(events.iter().all(|e| e.id != restock.id));
}

#[tokio::test]
async fn deleting_an_event_after_its_item_is_archived_still_reverses_stock() {
    let store = Arc::new(MemoryStore::new());
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let service = InventoryService::connect(
        Arc::clone(&store) as Arc<dyn DocumentStore>,
        "test-house",
        Permissions::full(),
        None,
        EventSender::new(tx),
        true,
    )
    .await
    .expect("service should connect");

    let actor = service
        .add_entity(Entity::person("Jordan", "Smith", PersonRole::Resident))
        .await
        .unwrap();
    let item = service
        .add_item("Dish Soap".into(), "🧴".into(), false)
        .await
        .unwrap();
    let restock = service
        .restock_item(item.id, actor.id, 6, None, None)
        .await
        .unwrap();
    service.delete_item(item.id).await.unwrap();

    // the log still goes away and the archived counter is reversed
    service.delete_event(restock.id).await.unwrap();

    assert!(service.events_for_item(item.id).await.is_empty());
    let stored = store.list_items("test-house").await.unwrap();
    let archived = stored.iter().find(|i| i.id == item.id).unwrap();
    assert!(archived.deleted);
    assert_eq!(archived.current_stock, 0);
}

#[tokio::test]
async fn returned_events_do_not_move_the_stock_counter() {
    let service = demo_service().await;
    let actor = service
        .add_entity(Entity::person("Alex", "Johnson", PersonRole::Resident))
        .await
        .unwrap();
    let drill = service
        .add_item("Power Drill".into(), "🔧".into(), true)
        .await
        .unwrap();
    service
        .restock_item(
            drill.id,
            actor.id,
            1,
            Some(Utc::now() - Duration::hours(3)),
            None,
        )
        .await
        .unwrap();

    service
        .log_event(NewEventRequest {
            actor_id: actor.id,
            item_id: drill.id,
            action: EventAction::Consumed,
            quantity: 1,
            occurred_at: Some(Utc::now() - Duration::hours(2)),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(current_stock(&service, drill.id).await, 0);

    let held = service.held_reusables(actor.id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].quantity_held, 1);

    // returning settles the held balance but leaves the counter alone
    let returned = service
        .log_event(NewEventRequest {
            actor_id: actor.id,
            item_id: drill.id,
            action: EventAction::Returned,
            quantity: 1,
            occurred_at: Some(Utc::now() - Duration::hours(1)),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(returned.resulting_stock, Some(0));
    assert_eq!(current_stock(&service, drill.id).await, 0);
    assert!(service.held_reusables(actor.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_logging_applies_events_in_order() {
    let fx = paper_towels_fixture().await;
    let base = Utc::now() - Duration::hours(3);

    let logged = fx
        .service
        .log_events_batch(vec![
            NewEventRequest {
                actor_id: fx.actor_id,
                item_id: fx.item_id,
                action: EventAction::Consumed,
                quantity: 2,
                occurred_at: Some(base),
                note: None,
            },
            NewEventRequest {
                actor_id: fx.actor_id,
                item_id: fx.item_id,
                action: EventAction::Consumed,
                quantity: 3,
                occurred_at: Some(base + Duration::minutes(1)),
                note: None,
            },
        ])
        .await
        .unwrap();

    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].resulting_stock, Some(4));
    assert_eq!(logged[1].resulting_stock, Some(1));
    assert_eq!(current_stock(&fx.service, fx.item_id).await, 1);
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let fx = paper_towels_fixture().await;

    let result = fx
        .service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 0,
            occurred_at: None,
            note: None,
        })
        .await;

    assert!(matches!(result, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn moved_out_entities_cannot_log_events() {
    let fx = paper_towels_fixture().await;
    fx.service.move_out(fx.actor_id, None).await.unwrap();

    let result = fx
        .service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 1,
            occurred_at: None,
            note: None,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));

    // reactivation restores the actor
    fx.service.reactivate(fx.actor_id).await.unwrap();
    assert!(fx
        .service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 1,
            occurred_at: None,
            note: None,
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn editors_cannot_delete() {
    let editor = Permissions {
        is_owner: false,
        can_view: true,
        can_edit: true,
        can_delete: false,
        can_manage_access: false,
    };
    let service = demo_service_with(editor).await;
    let actor = service
        .add_entity(Entity::person("Sam", "Lee", PersonRole::Guest))
        .await
        .unwrap();
    let item = service
        .add_item("Dish Soap".into(), "🧴".into(), false)
        .await
        .unwrap();
    let event = service
        .restock_item(item.id, actor.id, 3, None, None)
        .await
        .unwrap();

    assert!(matches!(
        service.delete_event(event.id).await,
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        service.delete_item(item.id).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn viewers_cannot_mutate() {
    let service = demo_service_with(Permissions::NONE).await;
    let result = service
        .add_item("Sponges".into(), "🧽".into(), false)
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden(_))));
}

#[tokio::test]
async fn every_mutation_lands_in_the_audit_trail() {
    let fx = paper_towels_fixture().await;
    fx.service
        .log_event(NewEventRequest {
            actor_id: fx.actor_id,
            item_id: fx.item_id,
            action: EventAction::Consumed,
            quantity: 1,
            occurred_at: None,
            note: None,
        })
        .await
        .unwrap();

    let audit = fx.service.audit_trail().await.unwrap();
    let actions: Vec<&str> = audit.iter().map(|a| a.action.as_str()).collect();
    assert!(actions.contains(&"created-item"));
    assert!(actions.contains(&"log-restocked"));
    assert!(actions.contains(&"log-consumed"));
    assert!(actions.contains(&"stock-updated"));
}
