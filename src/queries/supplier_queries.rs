use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Alias, Expr},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QueryResult, QuerySelect, QueryTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use super::{decimal_sums, filters::PurchaseFilter, money, period::Period, Query};
use crate::{
    entities::{purchase, supplier},
    errors::ServiceError,
};

/// A supplier with the sum of its purchases in a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SupplierTotal {
    #[serde(flatten)]
    pub supplier: supplier::Model,
    #[schema(value_type = String, example = "1500.00")]
    pub total: Decimal,
}

impl FromQueryResult for SupplierTotal {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        let total: Option<Decimal> = res.try_get(pre, "total")?;
        Ok(Self {
            supplier: supplier::Model::from_query_result(res, pre)?,
            total: money(total.unwrap_or(Decimal::ZERO)),
        })
    }
}

/// Suppliers ranked by the total amount of their purchases in `period`.
///
/// Suppliers without purchases in the period are left out. Equal totals
/// are ordered by name.
#[derive(Debug, Clone)]
pub struct SuppliersByPurchasesQuery {
    pub period: Period,
    pub filter: PurchaseFilter,
    pub limit: Option<u64>,
}

impl SuppliersByPurchasesQuery {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            filter: PurchaseFilter::default(),
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: PurchaseFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    async fn rank_with_decimal_sums(
        &self,
        db_pool: &DatabaseConnection,
    ) -> Result<Vec<SupplierTotal>, ServiceError> {
        let sums =
            decimal_sums(db_pool, &self.period, &self.filter, purchase::Column::SupplierId).await?;
        if sums.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<SupplierTotal> = supplier::Entity::find()
            .filter(supplier::Column::Id.is_in(sums.keys().copied()))
            .all(db_pool)
            .await?
            .into_iter()
            .map(|supplier| SupplierTotal {
                total: money(sums.get(&supplier.id).copied().unwrap_or_default()),
                supplier,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.supplier.name.cmp(&b.supplier.name))
        });
        if let Some(limit) = self.limit {
            ranked.truncate(limit as usize);
        }
        Ok(ranked)
    }
}

#[async_trait]
impl Query for SuppliersByPurchasesQuery {
    type Result = Vec<SupplierTotal>;

    #[instrument(skip(self, db_pool), fields(start = %self.period.start, end = %self.period.end))]
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if db_pool.get_database_backend() != DbBackend::Postgres {
            return self.rank_with_decimal_sums(db_pool).await;
        }

        let results = supplier::Entity::find()
            .column_as(
                Expr::col((purchase::Entity, purchase::Column::Amount)).sum(),
                "total",
            )
            .inner_join(purchase::Entity)
            .filter(self.period.condition())
            .apply_if(self.filter.condition(), |query, condition| query.filter(condition))
            .group_by(supplier::Column::Id)
            .order_by_desc(Expr::col(Alias::new("total")))
            .order_by_asc(supplier::Column::Name)
            .limit(self.limit)
            .into_model::<SupplierTotal>()
            .all(db_pool)
            .await?;

        Ok(results)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierBySlugQuery {
    pub slug: String,
}

#[async_trait]
impl Query for SupplierBySlugQuery {
    type Result = Option<supplier::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        supplier::Entity::find()
            .filter(supplier::Column::Slug.eq(self.slug.as_str()))
            .one(db_pool)
            .await
            .map_err(ServiceError::from)
    }
}
