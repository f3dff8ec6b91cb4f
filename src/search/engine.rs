use super::normalize::SearchLanguage;
use super::tsquery::TsQuery;
use crate::{entities::purchase, errors::ServiceError};
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Alias, Expr, IntoIden, SimpleExpr},
    DatabaseConnection, DbBackend, DbErr, FromQueryResult, QueryResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

pub const SEARCH_INDEX_COLUMN: &str = "search_index";

/// A purchase matched by a full-text search, with its relevance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredPurchase {
    #[serde(flatten)]
    pub purchase: purchase::Model,
    /// Best line-item rank, normalized to `[0, 1)`.
    pub rank: f32,
}

impl FromQueryResult for ScoredPurchase {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            purchase: purchase::Model::from_query_result(res, pre)?,
            rank: res.try_get(pre, "rank")?,
        })
    }
}

/// Number of rows whose search vector was rebuilt, per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReindexReport {
    pub suppliers: u64,
    pub departments: u64,
    pub line_items: u64,
}

/// Full-text search over purchases and maintenance of the `search_index`
/// columns it reads.
#[async_trait]
pub trait TextSearchEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn language(&self) -> SearchLanguage;

    /// Purchases whose line items, supplier or department match `query`,
    /// best line-item rank first, each purchase at most once.
    async fn search_purchases(
        &self,
        db: &DatabaseConnection,
        query: &str,
        limit: u64,
    ) -> Result<Vec<ScoredPurchase>, ServiceError>;

    async fn index_supplier(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError>;

    async fn index_department(&self, db: &DatabaseConnection, id: i64)
        -> Result<(), ServiceError>;

    async fn index_line_item(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError>;

    async fn reindex_all(&self, db: &DatabaseConnection) -> Result<ReindexReport, ServiceError>;
}

/// PostgreSQL gets the native engine, every other backend the in-process one.
pub fn engine_for(backend: DbBackend, language: SearchLanguage) -> Arc<dyn TextSearchEngine> {
    match backend {
        DbBackend::Postgres => Arc::new(super::PostgresTextSearch::new(language)),
        _ => Arc::new(super::InProcessTextSearch::new(language)),
    }
}

/// Parses and normalizes a raw query. `Ok(None)` means the query was valid
/// but held only stop words.
pub fn prepare_query(raw: &str, language: SearchLanguage) -> Result<Option<TsQuery>, ServiceError> {
    let parsed = TsQuery::parse(raw)?;
    Ok(parsed.normalize(language))
}

pub(crate) fn search_index_of<T: IntoIden + 'static>(table: T) -> SimpleExpr {
    Expr::col((table, Alias::new(SEARCH_INDEX_COLUMN))).into()
}
