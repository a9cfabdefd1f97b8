//! HouseStock: shared-household supply tracking.
//!
//! An append-only stock ledger (who consumed, restocked, or returned
//! what) over mirrored document-store collections, with derived
//! consumption statistics and an axum HTTP surface.

pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;

use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::services::{CatalogRegistry, InventoryService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<InventoryService>,
    pub registry: Arc<CatalogRegistry>,
}

/// Envelope for every JSON response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// All versioned API routes plus health and the swagger UI.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/items", handlers::items::items_router())
        .nest("/entities", handlers::entities::entities_router())
        .nest("/logs", handlers::logs::logs_router())
        .nest("/stats", handlers::stats::stats_router())
        .nest("/catalogs", handlers::catalogs::catalogs_router());

    Router::new()
        .merge(handlers::health::health_router())
        .merge(openapi::swagger_ui())
        .nest("/api/v1", api)
        .with_state(state)
}
