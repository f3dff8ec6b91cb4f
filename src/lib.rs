//! Public-spending transparency data layer.
//!
//! Purchase orders placed by government departments with suppliers, the
//! period rankings over them and a ranked full-text search, served as a
//! read-only JSON API and an operator CLI.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod search;
pub mod services;
pub mod slug;
pub mod tracing;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::search::TextSearchEngine;
use crate::services::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub search: Arc<dyn TextSearchEngine>,
    pub services: AppServices,
}

impl AppState {
    /// Wires the search engine matching the database backend and the services.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let search = search::engine_for(db.get_database_backend(), config.search_language());
        let services = AppServices::new(db.clone(), search.clone(), &config);
        Self {
            db,
            config,
            search,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    let suppliers = Router::new()
        .route("/ranking", get(handlers::suppliers::supplier_ranking))
        .route("/:slug", get(handlers::suppliers::get_supplier))
        .route("/:slug/purchases", get(handlers::suppliers::supplier_purchases));

    let departments = Router::new()
        .route("/ranking", get(handlers::departments::department_ranking))
        .route("/:slug", get(handlers::departments::get_department))
        .route(
            "/:slug/purchases",
            get(handlers::departments::department_purchases),
        );

    let purchases = Router::new()
        .route("/total", get(handlers::purchases::total_for_period))
        .route("/search", get(handlers::purchases::search_purchases))
        .route("/:year/:number", get(handlers::purchases::get_purchase));

    Router::new()
        // Status and health endpoints
        .route("/status", get(handlers::health::api_status))
        .route("/health", get(handlers::health::health_check))
        .nest("/suppliers", suppliers)
        .nest("/departments", departments)
        .nest("/purchases", purchases)
}

/// The full application: versioned API, request ids, HTTP tracing and
/// Swagger UI. CORS and compression are added by the server binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::db::DbPool;
    pub use crate::errors::ServiceError;
    pub use crate::queries::{Period, PurchaseFilter, Query};
    pub use crate::search::{SearchLanguage, TextSearchEngine};
    pub use crate::services::{AppServices, CatalogService, ReportService};
    pub use crate::{ApiResponse, AppState};
}
