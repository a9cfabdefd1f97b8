use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

/// `as_of` pins the evaluation instant; defaults to now. Mostly useful
/// for reproducible reads and tests.
#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsQuery {
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

pub fn stats_router() -> Router<AppState> {
    Router::new()
        .route("/items/:id", get(item_stats))
        .route("/entities/:id", get(entity_stats))
        .route("/entities/:id/held", get(entity_held))
}

/// Consumption statistics for one item. Returns null data when the item
/// has no events yet.
#[utoipa::path(
    get,
    path = "/api/v1/stats/items/{id}",
    params(("id" = Uuid, Path, description = "Item id"), StatsQuery),
    responses(
        (status = 200, description = "Item statistics returned"),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn item_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let now = query.as_of.unwrap_or_else(Utc::now);
    let stats = state.service.item_statistics(id, now).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Activity statistics for one person or location
#[utoipa::path(
    get,
    path = "/api/v1/stats/entities/{id}",
    params(("id" = Uuid, Path, description = "Entity id"), StatsQuery),
    responses(
        (status = 200, description = "Entity statistics returned"),
        (status = 404, description = "Entity not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn entity_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let now = query.as_of.unwrap_or_else(Utc::now);
    let stats = state.service.entity_statistics(id, now).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Reusable items currently held by an entity (taken but not returned)
#[utoipa::path(
    get,
    path = "/api/v1/stats/entities/{id}/held",
    params(("id" = Uuid, Path, description = "Entity id")),
    responses(
        (status = 200, description = "Held items returned"),
        (status = 404, description = "Entity not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stats"
)]
pub async fn entity_held(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let held = state.service.held_reusables(id).await?;
    Ok(Json(ApiResponse::success(held)))
}
