//! Facades over the query and command objects, shared by the HTTP handlers
//! and the CLI.

pub mod catalog;
pub mod reports;

pub use catalog::CatalogService;
pub use reports::ReportService;

use crate::{config::AppConfig, db::DbPool, search::TextSearchEngine};
use std::sync::Arc;

/// Container for every service the handlers reach through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub reports: Arc<ReportService>,
    pub catalog: Arc<CatalogService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, search: Arc<dyn TextSearchEngine>, config: &AppConfig) -> Self {
        Self {
            reports: Arc::new(ReportService::new(
                db_pool.clone(),
                search.clone(),
                config.search_default_limit,
                config.search_max_limit,
            )),
            catalog: Arc::new(CatalogService::new(db_pool, search)),
        }
    }
}
