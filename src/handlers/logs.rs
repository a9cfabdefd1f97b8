use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use http::StatusCode;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::{EventPatch, NewEventRequest};
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchLogRequest {
    #[validate(length(min = 1, max = 100))]
    pub events: Vec<NewEventRequest>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LogListFilters {
    #[serde(default)]
    pub limit: Option<usize>,
}

pub fn logs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs).post(log_event))
        .route("/batch", post(log_events_batch))
        .route("/:id", put(update_log).delete(delete_log))
        .route("/audit", get(audit_trail))
}

/// Recent ledger entries across all items, newest first
#[utoipa::path(
    get,
    path = "/api/v1/logs",
    params(LogListFilters),
    responses((status = 200, description = "Ledger entries returned")),
    tag = "logs"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(filters): Query<LogListFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let events = state.service.events(filters.limit).await;
    Ok(Json(ApiResponse::success(events)))
}

/// Log one consumption, restock, or return event
#[utoipa::path(
    post,
    path = "/api/v1/logs",
    request_body = NewEventRequest,
    responses(
        (status = 201, description = "Event logged"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item or actor not found", body = crate::errors::ErrorResponse)
    ),
    tag = "logs"
)]
pub async fn log_event(
    State(state): State<AppState>,
    Json(payload): Json<NewEventRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.service.log_event(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(event))))
}

/// Log several events in one call; they are applied in order
#[utoipa::path(
    post,
    path = "/api/v1/logs/batch",
    request_body = BatchLogRequest,
    responses(
        (status = 201, description = "Events logged"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "logs"
)]
pub async fn log_events_batch(
    State(state): State<AppState>,
    Json(payload): Json<BatchLogRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let events = state.service.log_events_batch(payload.events).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(events))))
}

/// Edit a ledger entry; the item's timeline is replayed afterwards
#[utoipa::path(
    put,
    path = "/api/v1/logs/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = EventPatch,
    responses(
        (status = 200, description = "Event updated"),
        (status = 404, description = "Event not found", body = crate::errors::ErrorResponse)
    ),
    tag = "logs"
)]
pub async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let event = state.service.update_event(id, patch).await?;
    Ok(Json(ApiResponse::success(event)))
}

/// Delete a ledger entry and reverse its stock effect
#[utoipa::path(
    delete,
    path = "/api/v1/logs/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Event not found", body = crate::errors::ErrorResponse)
    ),
    tag = "logs"
)]
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.service.delete_event(id).await?;
    Ok(Json(ApiResponse::<()>::message("event deleted")))
}

/// The immutable audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/v1/logs/audit",
    responses((status = 200, description = "Audit entries returned")),
    tag = "logs"
)]
pub async fn audit_trail(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let entries = state.service.audit_trail().await?;
    Ok(Json(ApiResponse::success(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventAction;

    fn consume_one() -> NewEventRequest {
        NewEventRequest {
            actor_id: Uuid::new_v4(),
            item_id: Uuid::new_v4(),
            action: EventAction::Consumed,
            quantity: 1,
            occurred_at: None,
            note: None,
        }
    }

    #[test]
    fn batch_length_bounds_are_enforced() {
        let empty = BatchLogRequest { events: vec![] };
        assert!(empty.validate().is_err());

        let single = BatchLogRequest {
            events: vec![consume_one()],
        };
        assert!(single.validate().is_ok());

        let oversized = BatchLogRequest {
            events: (0..101).map(|_| consume_one()).collect(),
        };
        assert!(oversized.validate().is_err());
    }
}
