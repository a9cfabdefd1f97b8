use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use http::StatusCode;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Entity, LocationRole, PersonRole};
use crate::services::EntityPatch;
use crate::{ApiResponse, AppState};

/// Creation payload, discriminated the same way the stored documents are.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum CreateEntityRequest {
    Person {
        first_name: String,
        last_name: String,
        #[serde(default)]
        role: Option<PersonRole>,
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        expected_departure: Option<NaiveDate>,
    },
    Location {
        display_name: String,
        #[serde(default)]
        role: Option<LocationRole>,
        #[serde(default)]
        bed_size: Option<String>,
    },
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveOutRequest {
    #[serde(default)]
    pub moved_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EntityListFilters {
    #[serde(default)]
    pub include_moved_out: Option<bool>,
}

pub fn entities_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_entities).post(create_entity))
        .route("/:id", put(update_entity))
        .route("/:id/move-out", post(move_out))
        .route("/:id/reactivate", post(reactivate))
        .route("/:id/events", get(entity_events))
}

/// List entities; moved-out ones are excluded unless asked for
#[utoipa::path(
    get,
    path = "/api/v1/entities",
    params(EntityListFilters),
    responses((status = 200, description = "Entity list returned")),
    tag = "entities"
)]
pub async fn list_entities(
    State(state): State<AppState>,
    Query(filters): Query<EntityListFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let entities = state
        .service
        .entities(filters.include_moved_out.unwrap_or(false))
        .await;
    Ok(Json(ApiResponse::success(entities)))
}

#[utoipa::path(
    post,
    path = "/api/v1/entities",
    request_body = CreateEntityRequest,
    responses(
        (status = 201, description = "Entity created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn create_entity(
    State(state): State<AppState>,
    Json(payload): Json<CreateEntityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let entity = match payload {
        CreateEntityRequest::Person {
            first_name,
            last_name,
            role,
            room,
            expected_departure,
        } => {
            let mut entity =
                Entity::person(first_name, last_name, role.unwrap_or(PersonRole::Resident));
            entity.room = room;
            if let crate::models::EntityKind::Person {
                expected_departure: dep,
                ..
            } = &mut entity.kind
            {
                *dep = expected_departure;
            }
            entity
        }
        CreateEntityRequest::Location {
            display_name,
            role,
            bed_size,
        } => {
            let mut entity =
                Entity::location(display_name, role.unwrap_or(LocationRole::Common));
            if let crate::models::EntityKind::Location { bed_size: size, .. } = &mut entity.kind {
                *size = bed_size;
            }
            entity
        }
    };
    let entity = state.service.add_entity(entity).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entity))))
}

#[utoipa::path(
    put,
    path = "/api/v1/entities/{id}",
    params(("id" = Uuid, Path, description = "Entity id")),
    request_body = EntityPatch,
    responses(
        (status = 200, description = "Entity updated"),
        (status = 404, description = "Entity not found", body = crate::errors::ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn update_entity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<EntityPatch>,
) -> Result<impl IntoResponse, ServiceError> {
    let entity = state.service.update_entity(id, patch).await?;
    Ok(Json(ApiResponse::success(entity)))
}

/// Mark an entity as moved out. History is kept; there is no hard delete.
#[utoipa::path(
    post,
    path = "/api/v1/entities/{id}/move-out",
    params(("id" = Uuid, Path, description = "Entity id")),
    request_body = MoveOutRequest,
    responses(
        (status = 200, description = "Entity moved out"),
        (status = 404, description = "Entity not found", body = crate::errors::ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn move_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveOutRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let entity = state.service.move_out(id, payload.moved_out_at).await?;
    Ok(Json(ApiResponse::success(entity)))
}

#[utoipa::path(
    post,
    path = "/api/v1/entities/{id}/reactivate",
    params(("id" = Uuid, Path, description = "Entity id")),
    responses(
        (status = 200, description = "Entity reactivated"),
        (status = 404, description = "Entity not found", body = crate::errors::ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn reactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let entity = state.service.reactivate(id).await?;
    Ok(Json(ApiResponse::success(entity)))
}

/// Ledger entries attributed to one entity, newest first
#[utoipa::path(
    get,
    path = "/api/v1/entities/{id}/events",
    params(("id" = Uuid, Path, description = "Entity id")),
    responses((status = 200, description = "Event history returned")),
    tag = "entities"
)]
pub async fn entity_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let mut events = state.service.events_for_actor(id).await;
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    Ok(Json(ApiResponse::success(events)))
}
