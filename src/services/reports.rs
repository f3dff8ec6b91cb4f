use crate::{
    db::DbPool,
    entities::purchase,
    errors::ServiceError,
    queries::{
        DepartmentTotal, DepartmentsBySpendQuery, Period, PurchaseFilter, PurchasesInPeriodQuery,
        Query, SearchPurchasesQuery, SupplierTotal, SuppliersByPurchasesQuery, TotalForPeriodQuery,
    },
    search::{ScoredPurchase, TextSearchEngine},
};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Read-only reports over a period: rankings, totals and search.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
    search: Arc<dyn TextSearchEngine>,
    default_search_limit: u64,
    max_search_limit: u64,
}

impl ReportService {
    pub fn new(
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
        default_search_limit: u64,
        max_search_limit: u64,
    ) -> Self {
        Self {
            db_pool,
            search,
            default_search_limit,
            max_search_limit: max_search_limit.max(1),
        }
    }

    /// Clamps a caller-supplied limit to `1..=max`.
    pub fn search_limit(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_search_limit)
            .clamp(1, self.max_search_limit)
    }

    /// Suppliers ranked by the amount purchased from them in `period`.
    #[instrument(skip(self, filter), fields(start = %period.start, end = %period.end))]
    pub async fn supplier_ranking(
        &self,
        period: Period,
        filter: PurchaseFilter,
        limit: Option<u64>,
    ) -> Result<Vec<SupplierTotal>, ServiceError> {
        let mut query = SuppliersByPurchasesQuery::new(period).with_filter(filter);
        query.limit = limit;
        let ranking = query.execute(&self.db_pool).await?;
        debug!(rows = ranking.len(), "Supplier ranking computed");
        Ok(ranking)
    }

    /// Departments ranked by what they spent in `period`.
    #[instrument(skip(self, filter), fields(start = %period.start, end = %period.end))]
    pub async fn department_ranking(
        &self,
        period: Period,
        filter: PurchaseFilter,
        limit: Option<u64>,
    ) -> Result<Vec<DepartmentTotal>, ServiceError> {
        let mut query = DepartmentsBySpendQuery::new(period).with_filter(filter);
        query.limit = limit;
        let ranking = query.execute(&self.db_pool).await?;
        debug!(rows = ranking.len(), "Department ranking computed");
        Ok(ranking)
    }

    #[instrument(skip(self, filter), fields(start = %period.start, end = %period.end))]
    pub async fn total_for_period(
        &self,
        period: Period,
        filter: PurchaseFilter,
    ) -> Result<Decimal, ServiceError> {
        TotalForPeriodQuery::new(period)
            .with_filter(filter)
            .execute(&self.db_pool)
            .await
    }

    /// Purchases in `period`, newest first.
    #[instrument(skip(self, filter), fields(start = %period.start, end = %period.end))]
    pub async fn purchases_in_period(
        &self,
        period: Period,
        filter: PurchaseFilter,
        limit: Option<u64>,
    ) -> Result<Vec<purchase::Model>, ServiceError> {
        let mut query = PurchasesInPeriodQuery::new(period, filter);
        query.limit = limit;
        query.execute(&self.db_pool).await
    }

    /// Ranked full-text search over purchases.
    #[instrument(skip(self), fields(engine = self.search.name()))]
    pub async fn search(
        &self,
        text: &str,
        limit: Option<u64>,
    ) -> Result<Vec<ScoredPurchase>, ServiceError> {
        let start = Instant::now();
        let query = SearchPurchasesQuery {
            text: text.to_string(),
            limit: self.search_limit(limit),
            engine: self.search.clone(),
        };
        let result = query.execute(&self.db_pool).await;
        histogram!("gasto_publico_search.duration", start.elapsed());
        match &result {
            Ok(hits) => debug!(hits = hits.len(), "Search completed"),
            Err(ServiceError::QuerySyntax(msg)) => {
                counter!("gasto_publico_search.syntax_errors", 1);
                warn!(error = %msg, "Rejected search query");
            }
            Err(_) => counter!("gasto_publico_search.failures", 1),
        }
        result
    }
}
