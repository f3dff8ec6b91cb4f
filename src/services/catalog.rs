use crate::{
    commands::{
        departments::{CreateDepartmentCommand, UpdateDepartmentCommand},
        purchases::{CreatePurchaseCommand, DeletePurchaseCommand, UpdateLineItemCommand},
        search::ReindexCommand,
        suppliers::{CreateSupplierCommand, UpdateSupplierCommand},
        Command,
    },
    db::DbPool,
    entities::{department, purchase, purchase_line_item, supplier},
    errors::ServiceError,
    queries::{
        DepartmentBySlugQuery, PurchaseByOrderCodeQuery, PurchaseDetail, Query,
        SupplierBySlugQuery,
    },
    search::{ReindexReport, TextSearchEngine},
};
use std::sync::Arc;
use tracing::instrument;

/// Lookups and data entry for suppliers, departments and purchases.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
    search: Arc<dyn TextSearchEngine>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>, search: Arc<dyn TextSearchEngine>) -> Self {
        Self { db_pool, search }
    }

    #[instrument(skip(self))]
    pub async fn supplier_by_slug(&self, slug: &str) -> Result<supplier::Model, ServiceError> {
        SupplierBySlugQuery {
            slug: slug.to_string(),
        }
        .execute(&self.db_pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Supplier '{}' not found", slug)))
    }

    #[instrument(skip(self))]
    pub async fn department_by_slug(&self, slug: &str) -> Result<department::Model, ServiceError> {
        DepartmentBySlugQuery {
            slug: slug.to_string(),
        }
        .execute(&self.db_pool)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Department '{}' not found", slug)))
    }

    /// The purchase printed as order `number/year`, with its line items.
    #[instrument(skip(self))]
    pub async fn purchase_by_order_code(
        &self,
        year: i32,
        number: i32,
    ) -> Result<PurchaseDetail, ServiceError> {
        PurchaseByOrderCodeQuery { year, number }
            .execute(&self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase {}/{} not found", number, year)))
    }

    #[instrument(skip(self, command))]
    pub async fn create_supplier(
        &self,
        command: CreateSupplierCommand,
    ) -> Result<supplier::Model, ServiceError> {
        command.execute(self.db_pool.clone(), self.search.clone()).await
    }

    #[instrument(skip(self, command), fields(supplier_id = command.id))]
    pub async fn update_supplier(
        &self,
        command: UpdateSupplierCommand,
    ) -> Result<supplier::Model, ServiceError> {
        command.execute(self.db_pool.clone(), self.search.clone()).await
    }

    #[instrument(skip(self, command))]
    pub async fn create_department(
        &self,
        command: CreateDepartmentCommand,
    ) -> Result<department::Model, ServiceError> {
        command.execute(self.db_pool.clone(), self.search.clone()).await
    }

    #[instrument(skip(self, command), fields(department_id = command.id))]
    pub async fn update_department(
        &self,
        command: UpdateDepartmentCommand,
    ) -> Result<department::Model, ServiceError> {
        command.execute(self.db_pool.clone(), self.search.clone()).await
    }

    #[instrument(skip(self, command))]
    pub async fn create_purchase(
        &self,
        command: CreatePurchaseCommand,
    ) -> Result<purchase::Model, ServiceError> {
        command.execute(self.db_pool.clone(), self.search.clone()).await
    }

    #[instrument(skip(self, command), fields(line_item_id = command.id))]
    pub async fn update_line_item(
        &self,
        command: UpdateLineItemCommand,
    ) -> Result<purchase_line_item::Model, ServiceError> {
        command.execute(self.db_pool.clone(), self.search.clone()).await
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase(&self, id: i64) -> Result<(), ServiceError> {
        DeletePurchaseCommand { id }
            .execute(self.db_pool.clone(), self.search.clone())
            .await
    }

    /// Rebuilds every search vector.
    pub async fn reindex(&self) -> Result<ReindexReport, ServiceError> {
        ReindexCommand
            .execute(self.db_pool.clone(), self.search.clone())
            .await
    }
}
