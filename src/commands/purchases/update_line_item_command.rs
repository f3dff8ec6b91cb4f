use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    commands::{check_storable_amount, clean, validate_amount, Command},
    db::DbPool,
    entities::purchase_line_item,
    errors::ServiceError,
    search::TextSearchEngine,
};

/// Partial update of a line item. A new detail text re-indexes the line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateLineItemCommand {
    #[serde(skip)]
    pub id: i64,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = Option<String>)]
    pub unit_amount: Option<Decimal>,
    #[validate(length(max = 128))]
    pub quantity: Option<String>,
    pub detail: Option<String>,
}

#[async_trait]
impl Command for UpdateLineItemCommand {
    type Result = purchase_line_item::Model;

    #[instrument(skip(self, db_pool, search), fields(line_item_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let db = db_pool.as_ref();
        if let Some(unit_amount) = self.unit_amount {
            check_storable_amount(db.get_database_backend(), "unit_amount", unit_amount)?;
        }

        let current = purchase_line_item::Entity::find_by_id(self.id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Line item {} not found", self.id)))?;

        let mut active = current.clone().into_active_model();
        if let Some(unit_amount) = self.unit_amount {
            active.unit_amount = Set(unit_amount);
        }
        if self.quantity.is_some() {
            active.quantity = Set(clean(&self.quantity));
        }
        let detail_changed = match &self.detail {
            Some(_) => {
                let detail = clean(&self.detail);
                let changed = detail != current.detail;
                active.detail = Set(detail);
                changed
            }
            None => false,
        };

        if !active.is_changed() {
            return Ok(current);
        }
        let saved = active.update(db).await?;

        if detail_changed {
            search.index_line_item(db, saved.id).await?;
            debug!("Line item re-indexed");
        }
        Ok(saved)
    }
}
