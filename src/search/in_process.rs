use super::engine::{
    prepare_query, search_index_of, ReindexReport, ScoredPurchase, TextSearchEngine,
    SEARCH_INDEX_COLUMN,
};
use super::normalize::SearchLanguage;
use super::tsvector::TsVector;
use crate::{
    entities::{department, purchase, purchase_line_item, supplier},
    errors::ServiceError,
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Alias, Expr, Query},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityName, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QuerySelect, RelationTrait, TransactionTrait,
};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Text search for databases without a native engine (SQLite).
///
/// `search_index` holds the textual form of a [`TsVector`]. The three-way
/// join still runs in the database; matching and ranking run here.
#[derive(Debug, Clone)]
pub struct InProcessTextSearch {
    language: SearchLanguage,
}

#[derive(Debug, FromQueryResult)]
struct SearchCandidate {
    purchase_id: i64,
    line_item_index: Option<String>,
    supplier_index: Option<String>,
    department_index: Option<String>,
}

fn document(raw: Option<&str>) -> Result<TsVector, ServiceError> {
    match raw {
        None => Ok(TsVector::default()),
        Some(text) => text
            .parse()
            .map_err(|e| ServiceError::InternalError(format!("corrupt search index: {}", e))),
    }
}

impl InProcessTextSearch {
    pub fn new(language: SearchLanguage) -> Self {
        Self { language }
    }

    async fn write_index<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: &str,
        id: i64,
        text: &str,
    ) -> Result<(), ServiceError> {
        let vector = TsVector::from_text(text, self.language).to_string();
        let stmt = Query::update()
            .table(Alias::new(table))
            .value(Alias::new(SEARCH_INDEX_COLUMN), vector)
            .and_where(Expr::col(Alias::new("id")).eq(id))
            .to_owned();
        conn.execute(conn.get_database_backend().build(&stmt)).await?;
        Ok(())
    }
}

#[async_trait]
impl TextSearchEngine for InProcessTextSearch {
    fn name(&self) -> &'static str {
        "in-process"
    }

    fn language(&self) -> SearchLanguage {
        self.language
    }

    #[instrument(skip(self, db), fields(engine = "in-process", language = %self.language))]
    async fn search_purchases(
        &self,
        db: &DatabaseConnection,
        query: &str,
        limit: u64,
    ) -> Result<Vec<ScoredPurchase>, ServiceError> {
        let Some(tsquery) = prepare_query(query, self.language)? else {
            debug!("query holds only stop words");
            return Ok(Vec::new());
        };

        let candidates = purchase::Entity::find()
            .select_only()
            .column_as(purchase::Column::Id, "purchase_id")
            .column_as(search_index_of(purchase_line_item::Entity), "line_item_index")
            .column_as(search_index_of(supplier::Entity), "supplier_index")
            .column_as(search_index_of(department::Entity), "department_index")
            .join(JoinType::LeftJoin, purchase::Relation::LineItems.def())
            .join(JoinType::LeftJoin, purchase::Relation::Supplier.def())
            .join(JoinType::LeftJoin, purchase::Relation::Department.def())
            .into_model::<SearchCandidate>()
            .all(db)
            .await?;

        let mut best: HashMap<i64, f32> = HashMap::new();
        for candidate in &candidates {
            let line_item = document(candidate.line_item_index.as_deref())?;
            let matched = tsquery.matches(&line_item)
                || tsquery.matches(&document(candidate.supplier_index.as_deref())?)
                || tsquery.matches(&document(candidate.department_index.as_deref())?);
            if !matched {
                continue;
            }
            let rank = tsquery.rank(&line_item);
            best.entry(candidate.purchase_id)
                .and_modify(|r| *r = r.max(rank))
                .or_insert(rank);
        }

        let mut ranked: Vec<(i64, f32)> = best.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        debug!(rows = candidates.len(), hits = ranked.len(), "search evaluated");
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
        let mut purchases: HashMap<i64, purchase::Model> = purchase::Entity::find()
            .filter(purchase::Column::Id.is_in(ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(ranked
            .into_iter()
            .filter_map(|(id, rank)| {
                purchases
                    .remove(&id)
                    .map(|purchase| ScoredPurchase { purchase, rank })
            })
            .collect())
    }

    async fn index_supplier(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError> {
        let supplier = supplier::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))?;
        self.write_index(db, supplier::Entity.table_name(), id, &supplier.search_text())
            .await
    }

    async fn index_department(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError> {
        let department = department::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Department {} not found", id)))?;
        self.write_index(db, department::Entity.table_name(), id, &department.name)
            .await
    }

    async fn index_line_item(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError> {
        let item = purchase_line_item::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Line item {} not found", id)))?;
        self.write_index(
            db,
            purchase_line_item::Entity.table_name(),
            id,
            item.detail.as_deref().unwrap_or_default(),
        )
        .await
    }

    #[instrument(skip(self, db), fields(language = %self.language))]
    async fn reindex_all(&self, db: &DatabaseConnection) -> Result<ReindexReport, ServiceError> {
        let txn = db.begin().await?;
        let mut report = ReindexReport::default();

        for supplier in supplier::Entity::find().all(&txn).await? {
            self.write_index(&txn, supplier::Entity.table_name(), supplier.id, &supplier.search_text())
                .await?;
            report.suppliers += 1;
        }
        for department in department::Entity::find().all(&txn).await? {
            self.write_index(&txn, department::Entity.table_name(), department.id, &department.name)
                .await?;
            report.departments += 1;
        }
        for item in purchase_line_item::Entity::find().all(&txn).await? {
            self.write_index(
                &txn,
                purchase_line_item::Entity.table_name(),
                item.id,
                item.detail.as_deref().unwrap_or_default(),
            )
            .await?;
            report.line_items += 1;
        }

        txn.commit().await?;
        Ok(report)
    }
}
