use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, ModelTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

use super::{decimal_sums, filters::PurchaseFilter, money, period::Period, Query};
use crate::{
    entities::{department, purchase, purchase_line_item, supplier},
    errors::ServiceError,
    search::{ScoredPurchase, TextSearchEngine},
};

#[derive(Debug, FromQueryResult)]
struct PeriodTotal {
    total: Option<Decimal>,
}

/// Sum of `amount` over the purchases dated in `period`. Zero when nothing
/// matches.
#[derive(Debug, Clone)]
pub struct TotalForPeriodQuery {
    pub period: Period,
    pub filter: PurchaseFilter,
}

impl TotalForPeriodQuery {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            filter: PurchaseFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: PurchaseFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait]
impl Query for TotalForPeriodQuery {
    type Result = Decimal;

    #[instrument(skip(self, db_pool), fields(start = %self.period.start, end = %self.period.end))]
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if db_pool.get_database_backend() != DbBackend::Postgres {
            let sums =
                decimal_sums(db_pool, &self.period, &self.filter, purchase::Column::Id).await?;
            return Ok(money(sums.into_values().sum()));
        }

        let row = purchase::Entity::find()
            .select_only()
            .column_as(
                Expr::col((purchase::Entity, purchase::Column::Amount)).sum(),
                "total",
            )
            .filter(self.period.condition())
            .apply_if(self.filter.condition(), |query, condition| query.filter(condition))
            .into_model::<PeriodTotal>()
            .one(db_pool)
            .await?;

        Ok(money(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO)))
    }
}

/// Purchases in a period, newest first.
#[derive(Debug, Clone)]
pub struct PurchasesInPeriodQuery {
    pub period: Period,
    pub filter: PurchaseFilter,
    pub limit: Option<u64>,
}

impl PurchasesInPeriodQuery {
    pub fn new(period: Period, filter: PurchaseFilter) -> Self {
        Self {
            period,
            filter,
            limit: None,
        }
    }
}

#[async_trait]
impl Query for PurchasesInPeriodQuery {
    type Result = Vec<purchase::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let purchases = purchase::Entity::find()
            .filter(self.period.condition())
            .apply_if(self.filter.condition(), |query, condition| query.filter(condition))
            .order_by_desc(purchase::Column::Date)
            .order_by_desc(purchase::Column::Id)
            .limit(self.limit)
            .all(db_pool)
            .await?;
        Ok(purchases)
    }
}

/// A purchase with everything its page shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PurchaseDetail {
    pub purchase: purchase::Model,
    /// `number/year`
    pub order_code: Option<String>,
    pub supplier: supplier::Model,
    pub department: department::Model,
    pub line_items: Vec<purchase_line_item::Model>,
}

impl PurchaseDetail {
    pub async fn load(
        db_pool: &DatabaseConnection,
        purchase: purchase::Model,
    ) -> Result<Self, ServiceError> {
        let supplier = purchase
            .find_related(supplier::Entity)
            .one(db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("purchase {} has no supplier", purchase.id))
            })?;
        let department = purchase
            .find_related(department::Entity)
            .one(db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("purchase {} has no department", purchase.id))
            })?;
        let line_items = purchase
            .find_related(purchase_line_item::Entity)
            .order_by_asc(purchase_line_item::Column::Id)
            .all(db_pool)
            .await?;

        Ok(Self {
            order_code: purchase.order_code(),
            purchase,
            supplier,
            department,
            line_items,
        })
    }
}

/// Looks a purchase up by its order code (`number/year`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseByOrderCodeQuery {
    pub year: i32,
    pub number: i32,
}

#[async_trait]
impl Query for PurchaseByOrderCodeQuery {
    type Result = Option<PurchaseDetail>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(self.year, 1, 1),
            NaiveDate::from_ymd_opt(self.year, 12, 31),
        ) else {
            return Ok(None);
        };

        let found = purchase::Entity::find()
            .filter(purchase::Column::OrderNumber.eq(self.number))
            .filter(Period::new(first, last).condition())
            .order_by_asc(purchase::Column::Id)
            .one(db_pool)
            .await?;

        match found {
            Some(purchase) => Ok(Some(PurchaseDetail::load(db_pool, purchase).await?)),
            None => Ok(None),
        }
    }
}

/// Ranked full-text search over line items, suppliers and departments.
#[derive(Clone)]
pub struct SearchPurchasesQuery {
    pub text: String,
    pub limit: u64,
    pub engine: Arc<dyn TextSearchEngine>,
}

impl std::fmt::Debug for SearchPurchasesQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPurchasesQuery")
            .field("text", &self.text)
            .field("limit", &self.limit)
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[async_trait]
impl Query for SearchPurchasesQuery {
    type Result = Vec<ScoredPurchase>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        self.engine
            .search_purchases(db_pool, &self.text, self.limit)
            .await
    }
}
