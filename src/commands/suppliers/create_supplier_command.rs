use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    commands::{clean, validate_not_blank, Command},
    db::DbPool,
    entities::supplier,
    errors::ServiceError,
    search::TextSearchEngine,
    slug::{slugify, unique_slug},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierCommand {
    #[validate(length(min = 1, max = 256), custom = "validate_not_blank")]
    pub name: String,
    /// CUIT
    #[validate(length(max = 32))]
    pub tax_id: Option<String>,
    #[validate(length(max = 128))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub locality: Option<String>,
    /// Derived from the name when absent
    #[validate(length(max = 64))]
    pub slug: Option<String>,
}

impl CreateSupplierCommand {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_id: None,
            address: None,
            locality: None,
            slug: None,
        }
    }
}

#[async_trait]
impl Command for CreateSupplierCommand {
    type Result = supplier::Model;

    #[instrument(skip(self, db_pool, search), fields(name = %self.name))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let db = db_pool.as_ref();

        let name = self.name.trim().to_string();
        let base = slugify(clean(&self.slug).as_deref().unwrap_or(&name));
        let slug = unique_slug::<supplier::Entity, _>(
            db,
            supplier::Column::Slug,
            supplier::Column::Id,
            &base,
            None,
        )
        .await?;

        let saved = supplier::ActiveModel {
            name: Set(name),
            tax_id: Set(clean(&self.tax_id)),
            address: Set(clean(&self.address)),
            locality: Set(clean(&self.locality)),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_error(e, "Supplier"))?;

        search.index_supplier(db, saved.id).await?;

        info!(supplier_id = saved.id, slug = %saved.slug, "Supplier created");
        Ok(saved)
    }
}
