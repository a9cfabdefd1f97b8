use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HouseStock API",
        description = r#"
# HouseStock Shared-Inventory API

Tracks the supply inventory of a shared household: who consumed what, when
items were restocked, which reusable items are currently checked out, and
how fast stock is running down.

## Ledger model

Every stock movement is an append-only event (`consumed`, `restocked`,
`returned`). Item documents carry a cached stock counter that the ledger
keeps in sync; editing or deleting a past event replays the item's
timeline so the counter and the per-event stock snapshots stay correct.

## Demo mode

With `APP__DEMO_MODE=true` the service runs against a seeded in-memory
store with no external document store. The API surface is identical.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::items::list_items,
        handlers::items::create_item,
        handlers::items::update_item,
        handlers::items::delete_item,
        handlers::items::restock_item,
        handlers::items::item_events,
        handlers::entities::list_entities,
        handlers::entities::create_entity,
        handlers::entities::update_entity,
        handlers::entities::move_out,
        handlers::entities::reactivate,
        handlers::entities::entity_events,
        handlers::logs::list_logs,
        handlers::logs::log_event,
        handlers::logs::log_events_batch,
        handlers::logs::update_log,
        handlers::logs::delete_log,
        handlers::logs::audit_trail,
        handlers::stats::item_stats,
        handlers::stats::entity_stats,
        handlers::stats::entity_held,
        handlers::catalogs::list_catalogs,
        handlers::catalogs::catalog_entries,
        handlers::catalogs::register_value,
        handlers::health::health_check,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::models::EventAction,
        crate::services::NewEventRequest,
        crate::services::EventPatch,
        crate::services::ItemPatch,
        crate::services::EntityPatch,
        handlers::items::CreateItemRequest,
        handlers::items::RestockRequest,
        handlers::entities::CreateEntityRequest,
        handlers::entities::MoveOutRequest,
        handlers::logs::BatchLogRequest,
        handlers::catalogs::RegisterValueRequest,
    )),
    tags(
        (name = "items", description = "Supply item management"),
        (name = "entities", description = "People and locations"),
        (name = "logs", description = "The stock ledger"),
        (name = "stats", description = "Derived consumption statistics"),
        (name = "catalogs", description = "Icon and tag vocabularies"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
