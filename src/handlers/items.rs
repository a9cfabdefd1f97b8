use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::ItemPatch;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 16))]
    pub icon: String,
    #[serde(default)]
    pub reusable: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RestockRequest {
    pub actor_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ItemListFilters {
    #[serde(default)]
    pub include_hidden: Option<bool>,
}

pub fn items_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/:id",
            axum::routing::put(update_item).delete(delete_item),
        )
        .route("/:id/restock", post(restock_item))
        .route("/:id/events", get(item_events))
}

/// List the inventory's items
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListFilters),
    responses(
        (status = 200, description = "Item list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filters): Query<ItemListFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .service
        .items(filters.include_hidden.unwrap_or(false))
        .await;
    Ok(Json(ApiResponse::success(items)))
}

/// Create an item with zero starting stock
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let item = state
        .service
        .add_item(payload.name, payload.icon, payload.reusable)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = ItemPatch,
    responses(
        (status = 200, description = "Item updated"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ItemPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.service.update_item(id, patch).await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Soft-delete an item; its event history stays intact
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.service.delete_item(id).await?;
    Ok(Json(ApiResponse::<()>::message("item deleted")))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/restock",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = RestockRequest,
    responses(
        (status = 201, description = "Restock logged"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn restock_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let event = state
        .service
        .restock_item(
            id,
            payload.actor_id,
            payload.quantity,
            payload.occurred_at,
            payload.note,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(event))))
}

/// Full ledger history for one item, newest first
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/events",
    params(("id" = Uuid, Path, description = "Item id")),
    responses((status = 200, description = "Event history returned")),
    tag = "items"
)]
pub async fn item_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut events = state.service.events_for_item(id).await;
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    Ok(Json(ApiResponse::success(events)))
}
