use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::{
    commands::Command,
    db::DbPool,
    errors::ServiceError,
    search::{ReindexReport, TextSearchEngine},
};

/// Rebuilds every search vector with the engine's current language.
#[derive(Debug, Clone, Default)]
pub struct ReindexCommand;

#[async_trait]
impl Command for ReindexCommand {
    type Result = ReindexReport;

    #[instrument(skip_all, fields(engine = search.name(), language = ?search.language()))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        let start = Instant::now();
        let report = search.reindex_all(db_pool.as_ref()).await?;
        metrics::histogram!("gasto_publico_search.reindex.duration", start.elapsed());
        info!(
            suppliers = report.suppliers,
            departments = report.departments,
            line_items = report.line_items,
            "Search index rebuilt"
        );
        Ok(report)
    }
}
