use super::engine::{ReindexReport, ScoredPurchase, TextSearchEngine, SEARCH_INDEX_COLUMN};
use super::normalize::SearchLanguage;
use super::tsquery::TsQuery;
use crate::{
    entities::{department, purchase, purchase_line_item, supplier},
    errors::ServiceError,
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::{Alias, Expr, Query, SimpleExpr, UpdateStatement},
    Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityName, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use tracing::{debug, instrument};

/// Native PostgreSQL full-text search: `search_index` columns are
/// `tsvector`s filled by `to_tsvector` and matched with `@@`.
#[derive(Debug, Clone)]
pub struct PostgresTextSearch {
    language: SearchLanguage,
}

impl PostgresTextSearch {
    pub fn new(language: SearchLanguage) -> Self {
        Self { language }
    }

    fn to_tsquery(&self) -> String {
        format!("to_tsquery('{}', $1)", self.language.regconfig())
    }

    fn to_tsvector(&self, source_sql: &str) -> SimpleExpr {
        Expr::cust(format!(
            "to_tsvector('{}', {})",
            self.language.regconfig(),
            source_sql
        ))
    }

    fn update(&self, table: &str, source_sql: &str, id: Option<i64>) -> UpdateStatement {
        let mut stmt = Query::update();
        stmt.table(Alias::new(table))
            .value(Alias::new(SEARCH_INDEX_COLUMN), self.to_tsvector(source_sql));
        if let Some(id) = id {
            stmt.and_where(Expr::col(Alias::new("id")).eq(id));
        }
        stmt
    }

    /// Purchases LEFT JOINed to their line items, supplier and department,
    /// kept when any of the three vectors matches and ranked by the best
    /// line-item `ts_rank_cd` (normalization 32).
    fn search_statement(&self, query: &str, limit: u64) -> Select<purchase::Entity> {
        let tsquery = self.to_tsquery();
        let matches = |table: &str| {
            Expr::cust_with_values(
                format!(r#""{}"."{}" @@ {}"#, table, SEARCH_INDEX_COLUMN, tsquery),
                [query.to_owned()],
            )
        };
        let rank = Expr::cust_with_values(
            format!(
                r#"COALESCE(MAX(ts_rank_cd("{}"."{}", {}, 32)), 0)"#,
                purchase_line_item::Entity.table_name(),
                SEARCH_INDEX_COLUMN,
                tsquery
            ),
            [query.to_owned()],
        );

        purchase::Entity::find()
            .expr_as(rank, "rank")
            .join(JoinType::LeftJoin, purchase::Relation::LineItems.def())
            .join(JoinType::LeftJoin, purchase::Relation::Supplier.def())
            .join(JoinType::LeftJoin, purchase::Relation::Department.def())
            .filter(
                Condition::any()
                    .add(matches(purchase_line_item::Entity.table_name()))
                    .add(matches(supplier::Entity.table_name()))
                    .add(matches(department::Entity.table_name())),
            )
            .group_by(purchase::Column::Id)
            .order_by_desc(Expr::col(Alias::new("rank")))
            .order_by_asc(purchase::Column::Id)
            .limit(limit)
    }

    async fn run(&self, db: &DatabaseConnection, stmt: &UpdateStatement) -> Result<u64, ServiceError> {
        let backend = db.get_database_backend();
        let result = db.execute(backend.build(stmt)).await?;
        Ok(result.rows_affected())
    }
}

const SUPPLIER_TEXT: &str = "concat_ws(' ', name, address, locality)";
const DEPARTMENT_TEXT: &str = "name";
const LINE_ITEM_TEXT: &str = "coalesce(detail, '')";

/// PostgreSQL reports malformed queries as "syntax error in tsquery".
fn map_search_error(err: DbErr) -> ServiceError {
    let message = err.to_string();
    if message.contains("syntax error in tsquery") {
        ServiceError::QuerySyntax(message)
    } else {
        ServiceError::DatabaseError(err)
    }
}

#[async_trait]
impl TextSearchEngine for PostgresTextSearch {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn language(&self) -> SearchLanguage {
        self.language
    }

    #[instrument(skip(self, db), fields(engine = "postgres", language = %self.language))]
    async fn search_purchases(
        &self,
        db: &DatabaseConnection,
        query: &str,
        limit: u64,
    ) -> Result<Vec<ScoredPurchase>, ServiceError> {
        // fail fast on syntax the database would reject anyway
        TsQuery::parse(query)?;

        let results = self
            .search_statement(query, limit)
            .into_model::<ScoredPurchase>()
            .all(db)
            .await
            .map_err(map_search_error)?;

        debug!(hits = results.len(), "search finished");
        Ok(results)
    }

    async fn index_supplier(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError> {
        let stmt = self.update(supplier::Entity.table_name(), SUPPLIER_TEXT, Some(id));
        self.run(db, &stmt).await.map(|_| ())
    }

    async fn index_department(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError> {
        let stmt = self.update(department::Entity.table_name(), DEPARTMENT_TEXT, Some(id));
        self.run(db, &stmt).await.map(|_| ())
    }

    async fn index_line_item(&self, db: &DatabaseConnection, id: i64) -> Result<(), ServiceError> {
        let stmt = self.update(purchase_line_item::Entity.table_name(), LINE_ITEM_TEXT, Some(id));
        self.run(db, &stmt).await.map(|_| ())
    }

    #[instrument(skip(self, db), fields(language = %self.language))]
    async fn reindex_all(&self, db: &DatabaseConnection) -> Result<ReindexReport, ServiceError> {
        let suppliers = self
            .run(db, &self.update(supplier::Entity.table_name(), SUPPLIER_TEXT, None))
            .await?;
        let departments = self
            .run(db, &self.update(department::Entity.table_name(), DEPARTMENT_TEXT, None))
            .await?;
        let line_items = self
            .run(
                db,
                &self.update(purchase_line_item::Entity.table_name(), LINE_ITEM_TEXT, None),
            )
            .await?;
        Ok(ReindexReport {
            suppliers,
            departments,
            line_items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait, Value};

    #[test]
    fn search_joins_three_tables_and_ranks_line_items() {
        let engine = PostgresTextSearch::new(SearchLanguage::Spanish);
        let stmt = engine
            .search_statement("insumos & medic:*", 25)
            .build(DbBackend::Postgres);
        let sql = stmt.sql.as_str();

        assert_eq!(sql.matches("LEFT JOIN").count(), 3, "{sql}");
        for table in ["purchase_line_items", "suppliers", "departments"] {
            assert!(sql.contains(&format!(r#"LEFT JOIN "{table}""#)), "{sql}");
            assert!(
                sql.contains(&format!(r#""{table}"."search_index" @@ to_tsquery('spanish', $"#)),
                "{sql}"
            );
        }
        assert_eq!(sql.matches(" OR ").count(), 2, "{sql}");
        assert!(
            sql.contains(
                r#"COALESCE(MAX(ts_rank_cd("purchase_line_items"."search_index", to_tsquery('spanish', $1), 32)), 0) AS "rank""#
            ),
            "{sql}"
        );
        assert!(sql.contains(r#"GROUP BY "purchases"."id""#), "{sql}");
        assert!(
            sql.contains(r#"ORDER BY "rank" DESC, "purchases"."id" ASC"#),
            "{sql}"
        );

        // the query text four times, then the limit
        let values = stmt.values.expect("bound values").0;
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], Value::from("insumos & medic:*"));
        assert_eq!(values[4], Value::from(25u64));
    }

    #[test]
    fn update_statement_uses_configured_language() {
        let engine = PostgresTextSearch::new(SearchLanguage::English);
        let stmt = engine.update("departments", DEPARTMENT_TEXT, Some(3));
        let sql = DbBackend::Postgres.build(&stmt).to_string();
        assert!(sql.contains(r#"SET "search_index" = to_tsvector('english', name)"#), "{sql}");
        assert!(sql.contains(r#""id" = 3"#), "{sql}");
    }

    #[test]
    fn maps_tsquery_syntax_errors() {
        let err = map_search_error(DbErr::Custom("syntax error in tsquery: \"a b\"".into()));
        assert!(matches!(err, ServiceError::QuerySyntax(_)));
        let err = map_search_error(DbErr::Custom("connection reset".into()));
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
