use axum::extract::{Path, Query, State};
use axum::Json;

use crate::{
    common::{PeriodParams, SupplierRankingParams},
    entities::{purchase, supplier},
    errors::ServiceError,
    queries::{PurchaseFilter, SupplierTotal},
    ApiResponse, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/ranking",
    summary = "Suppliers ranked by purchases",
    description = "Suppliers ordered by the total amount purchased from them in the period. \
                   Missing dates default to the current month so far.",
    params(SupplierRankingParams),
    responses(
        (status = 200, description = "Ranking computed", body = ApiResponse<Vec<SupplierTotal>>),
        (status = 400, description = "Malformed date", body = crate::errors::ErrorResponse),
    ),
    tag = "Suppliers"
)]
pub async fn supplier_ranking(
    State(state): State<AppState>,
    Query(params): Query<SupplierRankingParams>,
) -> Result<Json<ApiResponse<Vec<SupplierTotal>>>, ServiceError> {
    let period = params.period()?;
    let ranking = state
        .services
        .reports
        .supplier_ranking(period, params.filter(), params.limit)
        .await?;
    Ok(Json(ApiResponse::success(ranking)))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{slug}",
    summary = "Supplier detail",
    params(("slug" = String, Path, description = "Supplier slug")),
    responses(
        (status = 200, description = "Supplier found", body = ApiResponse<supplier::Model>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<supplier::Model>>, ServiceError> {
    let found = state.services.catalog.supplier_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{slug}/purchases",
    summary = "Purchases from a supplier",
    params(("slug" = String, Path, description = "Supplier slug"), PeriodParams),
    responses(
        (status = 200, description = "Purchases, newest first", body = ApiResponse<Vec<purchase::Model>>),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Suppliers"
)]
pub async fn supplier_purchases(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<ApiResponse<Vec<purchase::Model>>>, ServiceError> {
    let period = params.period()?;
    let found = state.services.catalog.supplier_by_slug(&slug).await?;
    let purchases = state
        .services
        .reports
        .purchases_in_period(period, PurchaseFilter::new().supplier_id(found.id), None)
        .await?;
    Ok(Json(ApiResponse::success(purchases)))
}
