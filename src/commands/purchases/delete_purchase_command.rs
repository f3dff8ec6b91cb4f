use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    commands::Command,
    db::DbPool,
    entities::{purchase, purchase_line_item},
    errors::ServiceError,
    search::TextSearchEngine,
};

/// Deletes a purchase together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePurchaseCommand {
    pub id: i64,
}

#[async_trait]
impl Command for DeletePurchaseCommand {
    type Result = ();

    #[instrument(skip(self, db_pool, _search), fields(purchase_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        _search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        let txn = db_pool.begin().await?;

        // the foreign key cascades too, but SQLite only honours it with
        // foreign_keys enabled
        let lines = purchase_line_item::Entity::delete_many()
            .filter(purchase_line_item::Column::PurchaseId.eq(self.id))
            .exec(&txn)
            .await?;
        let result = purchase::Entity::delete_by_id(self.id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::NotFound(format!(
                "Purchase {} not found",
                self.id
            )));
        }
        txn.commit().await?;

        info!(line_items = lines.rows_affected, "Purchase deleted");
        Ok(())
    }
}
