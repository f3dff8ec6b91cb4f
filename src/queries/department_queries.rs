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
    entities::{department, purchase},
    errors::ServiceError,
};

/// A department with the sum of its spending in a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DepartmentTotal {
    #[serde(flatten)]
    pub department: department::Model,
    #[schema(value_type = String, example = "1500.00")]
    pub total: Decimal,
}

impl FromQueryResult for DepartmentTotal {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        let total: Option<Decimal> = res.try_get(pre, "total")?;
        Ok(Self {
            department: department::Model::from_query_result(res, pre)?,
            total: money(total.unwrap_or(Decimal::ZERO)),
        })
    }
}

/// Departments ranked by total spend in `period`.
///
/// Departments without purchases in the period are left out. Equal totals
/// are ordered by name.
#[derive(Debug, Clone)]
pub struct DepartmentsBySpendQuery {
    pub period: Period,
    pub filter: PurchaseFilter,
    pub limit: Option<u64>,
}

impl DepartmentsBySpendQuery {
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
    ) -> Result<Vec<DepartmentTotal>, ServiceError> {
        let sums =
            decimal_sums(db_pool, &self.period, &self.filter, purchase::Column::DepartmentId).await?;
        if sums.is_empty() {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<DepartmentTotal> = department::Entity::find()
            .filter(department::Column::Id.is_in(sums.keys().copied()))
            .all(db_pool)
            .await?
            .into_iter()
            .map(|department| DepartmentTotal {
                total: money(sums.get(&department.id).copied().unwrap_or_default()),
                department,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.department.name.cmp(&b.department.name))
        });
        if let Some(limit) = self.limit {
            ranked.truncate(limit as usize);
        }
        Ok(ranked)
    }
}

#[async_trait]
impl Query for DepartmentsBySpendQuery {
    type Result = Vec<DepartmentTotal>;

    #[instrument(skip(self, db_pool), fields(start = %self.period.start, end = %self.period.end))]
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        if db_pool.get_database_backend() != DbBackend::Postgres {
            return self.rank_with_decimal_sums(db_pool).await;
        }

        let results = department::Entity::find()
            .column_as(
                Expr::col((purchase::Entity, purchase::Column::Amount)).sum(),
                "total",
            )
            .inner_join(purchase::Entity)
            .filter(self.period.condition())
            .apply_if(self.filter.condition(), |query, condition| query.filter(condition))
            .group_by(department::Column::Id)
            .order_by_desc(Expr::col(Alias::new("total")))
            .order_by_asc(department::Column::Name)
            .limit(self.limit)
            .into_model::<DepartmentTotal>()
            .all(db_pool)
            .await?;

        Ok(results)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentBySlugQuery {
    pub slug: String,
}

#[async_trait]
impl Query for DepartmentBySlugQuery {
    type Result = Option<department::Model>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        department::Entity::find()
            .filter(department::Column::Slug.eq(self.slug.as_str()))
            .one(db_pool)
            .await
            .map_err(ServiceError::from)
    }
}
