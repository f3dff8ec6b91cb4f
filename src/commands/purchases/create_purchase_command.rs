use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    commands::{check_storable_amount, clean, validate_amount, Command},
    db::DbPool,
    entities::{department, purchase, purchase_line_item, supplier},
    errors::ServiceError,
    search::TextSearchEngine,
};

/// A line of a purchase being created.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewLineItem {
    #[validate(custom = "validate_amount")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_amount: Decimal,
    #[validate(length(max = 128))]
    pub quantity: Option<String>,
    pub detail: Option<String>,
}

impl NewLineItem {
    pub fn new(detail: impl Into<String>, unit_amount: Decimal) -> Self {
        Self {
            unit_amount,
            quantity: None,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseCommand {
    #[validate(range(min = 0))]
    pub order_number: Option<i32>,
    pub date: Option<NaiveDate>,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = String, example = "1500.00")]
    pub amount: Decimal,
    #[validate(length(max = 32))]
    pub supply_reference: Option<String>,
    pub supplier_id: i64,
    pub department_id: i64,
    #[validate]
    #[serde(default)]
    pub line_items: Vec<NewLineItem>,
}

impl CreatePurchaseCommand {
    pub fn new(supplier_id: i64, department_id: i64, amount: Decimal) -> Self {
        Self {
            order_number: None,
            date: None,
            amount,
            supply_reference: None,
            supplier_id,
            department_id,
            line_items: Vec::new(),
        }
    }

    pub fn with_order(mut self, order_number: i32, date: NaiveDate) -> Self {
        self.order_number = Some(order_number);
        self.date = Some(date);
        self
    }

    pub fn with_line_item(mut self, item: NewLineItem) -> Self {
        self.line_items.push(item);
        self
    }
}

#[async_trait]
impl Command for CreatePurchaseCommand {
    type Result = purchase::Model;

    #[instrument(skip(self, db_pool, search), fields(supplier_id = self.supplier_id, department_id = self.department_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let db = db_pool.as_ref();
        let backend = db.get_database_backend();
        check_storable_amount(backend, "amount", self.amount)?;
        for item in &self.line_items {
            check_storable_amount(backend, "unit_amount", item.unit_amount)?;
        }
        let txn = db.begin().await?;

        if supplier::Entity::find_by_id(self.supplier_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidInput(format!(
                "Supplier {} does not exist",
                self.supplier_id
            )));
        }
        if department::Entity::find_by_id(self.department_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidInput(format!(
                "Department {} does not exist",
                self.department_id
            )));
        }

        let saved = purchase::ActiveModel {
            order_number: Set(self.order_number),
            date: Set(self.date),
            amount: Set(self.amount),
            supply_reference: Set(clean(&self.supply_reference)),
            supplier_id: Set(self.supplier_id),
            department_id: Set(self.department_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_write_error(e, "Purchase"))?;

        let mut line_item_ids = Vec::with_capacity(self.line_items.len());
        for item in &self.line_items {
            let line = purchase_line_item::ActiveModel {
                purchase_id: Set(saved.id),
                unit_amount: Set(item.unit_amount),
                quantity: Set(clean(&item.quantity)),
                detail: Set(clean(&item.detail)),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            line_item_ids.push(line.id);
        }

        txn.commit().await?;

        for id in line_item_ids {
            search.index_line_item(db, id).await?;
        }

        info!(
            purchase_id = saved.id,
            order_code = saved.order_code().as_deref().unwrap_or("s/n"),
            line_items = self.line_items.len(),
            "Purchase created"
        );
        Ok(saved)
    }
}
