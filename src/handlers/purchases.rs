use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::common::{parse_path_number, validate_input};
use crate::{
    common::{PeriodParams, SearchParams},
    errors::ServiceError,
    queries::{Period, PurchaseDetail, PurchaseFilter},
    search::ScoredPurchase,
    ApiResponse, AppState,
};

/// Total spend over a period.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeriodTotal {
    pub period: Period,
    #[schema(value_type = String, example = "1500.00")]
    pub total: Decimal,
}

#[utoipa::path(
    get,
    path = "/api/v1/purchases/total",
    summary = "Total spend in a period",
    params(PeriodParams),
    responses(
        (status = 200, description = "Sum of purchase amounts, zero when none", body = ApiResponse<PeriodTotal>),
        (status = 400, description = "Malformed date", body = crate::errors::ErrorResponse),
    ),
    tag = "Purchases"
)]
pub async fn total_for_period(
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<ApiResponse<PeriodTotal>>, ServiceError> {
    let period = params.period()?;
    let total = state
        .services
        .reports
        .total_for_period(period, PurchaseFilter::new())
        .await?;
    Ok(Json(ApiResponse::success(PeriodTotal { period, total })))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchases/search",
    summary = "Full-text search",
    description = "Purchases whose line items, supplier or department match the query, \
                   best line-item rank first. The query uses `to_tsquery` syntax.",
    params(SearchParams),
    responses(
        (status = 200, description = "Ranked purchases", body = ApiResponse<Vec<ScoredPurchase>>),
        (status = 400, description = "Query syntax error", body = crate::errors::ErrorResponse),
    ),
    tag = "Purchases"
)]
pub async fn search_purchases(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<ScoredPurchase>>>, ServiceError> {
    validate_input(&params)?;
    let hits = state
        .services
        .reports
        .search(&params.q, params.limit)
        .await?;
    Ok(Json(ApiResponse::success(hits)))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchases/{year}/{number}",
    summary = "Purchase by order code",
    params(
        ("year" = i32, Path, description = "Year of the purchase date"),
        ("number" = i32, Path, description = "Order number"),
    ),
    responses(
        (status = 200, description = "Purchase with its line items", body = ApiResponse<PurchaseDetail>),
        (status = 404, description = "Purchase not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Purchases"
)]
pub async fn get_purchase(
    State(state): State<AppState>,
    Path((year, number)): Path<(String, String)>,
) -> Result<Json<ApiResponse<PurchaseDetail>>, ServiceError> {
    let year = parse_path_number("year", &year)?;
    let number = parse_path_number("order number", &number)?;
    let detail = state
        .services
        .catalog
        .purchase_by_order_code(year, number)
        .await?;
    Ok(Json(ApiResponse::success(detail)))
}
