use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use http::StatusCode;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::ServiceError;
use crate::{ApiResponse, AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterValueRequest {
    #[validate(length(min = 1, max = 50))]
    pub value: String,
}

pub fn catalogs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalogs))
        .route("/:name", get(catalog_entries).post(register_value))
}

/// Names of the available icon and tag catalogs
#[utoipa::path(
    get,
    path = "/api/v1/catalogs",
    responses((status = 200, description = "Catalog names returned")),
    tag = "catalogs"
)]
pub async fn list_catalogs(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(state.registry.catalog_names())))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalogs/{name}",
    params(("name" = String, Path, description = "Catalog name")),
    responses((status = 200, description = "Catalog entries returned")),
    tag = "catalogs"
)]
pub async fn catalog_entries(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(Json(ApiResponse::success(state.registry.entries(&name))))
}

/// Add a value to a catalog; duplicates are ignored
#[utoipa::path(
    post,
    path = "/api/v1/catalogs/{name}",
    params(("name" = String, Path, description = "Catalog name")),
    request_body = RegisterValueRequest,
    responses(
        (status = 201, description = "Value registered"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "catalogs"
)]
pub async fn register_value(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<RegisterValueRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    state.registry.register(&name, payload.value);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(state.registry.entries(&name))),
    ))
}
