use axum::extract::{Path, Query, State};
use axum::Json;

use crate::{
    common::{PeriodParams, DepartmentRankingParams},
    entities::{department, purchase},
    errors::ServiceError,
    queries::{PurchaseFilter, DepartmentTotal},
    ApiResponse, AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/departments/ranking",
    summary = "Departments ranked by spend",
    description = "Departments ordered by the total they spent in the period. \
                   Missing dates default to the current month so far.",
    params(DepartmentRankingParams),
    responses(
        (status = 200, description = "Ranking computed", body = ApiResponse<Vec<DepartmentTotal>>),
        (status = 400, description = "Malformed date", body = crate::errors::ErrorResponse),
    ),
    tag = "Departments"
)]
pub async fn department_ranking(
    State(state): State<AppState>,
    Query(params): Query<DepartmentRankingParams>,
) -> Result<Json<ApiResponse<Vec<DepartmentTotal>>>, ServiceError> {
    let period = params.period()?;
    let ranking = state
        .services
        .reports
        .department_ranking(period, params.filter(), params.limit)
        .await?;
    Ok(Json(ApiResponse::success(ranking)))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments/{slug}",
    summary = "Department detail",
    params(("slug" = String, Path, description = "Department slug")),
    responses(
        (status = 200, description = "Department found", body = ApiResponse<department::Model>),
        (status = 404, description = "Department not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Departments"
)]
pub async fn get_department(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<department::Model>>, ServiceError> {
    let found = state.services.catalog.department_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments/{slug}/purchases",
    summary = "Purchases of a department",
    params(("slug" = String, Path, description = "Department slug"), PeriodParams),
    responses(
        (status = 200, description = "Purchases, newest first", body = ApiResponse<Vec<purchase::Model>>),
        (status = 404, description = "Department not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Departments"
)]
pub async fn department_purchases(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PeriodParams>,
) -> Result<Json<ApiResponse<Vec<purchase::Model>>>, ServiceError> {
    let period = params.period()?;
    let found = state.services.catalog.department_by_slug(&slug).await?;
    let purchases = state
        .services
        .reports
        .purchases_in_period(period, PurchaseFilter::new().department_id(found.id), None)
        .await?;
    Ok(Json(ApiResponse::success(purchases)))
}
