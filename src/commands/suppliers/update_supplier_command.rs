use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
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

/// Partial update; `None` leaves a field as it is. Renaming recomputes the
/// slug, and any change re-indexes the supplier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierCommand {
    #[serde(skip)]
    pub id: i64,
    #[validate(length(min = 1, max = 256), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub tax_id: Option<String>,
    #[validate(length(max = 128))]
    pub address: Option<String>,
    #[validate(length(max = 128))]
    pub locality: Option<String>,
}

#[async_trait]
impl Command for UpdateSupplierCommand {
    type Result = supplier::Model;

    #[instrument(skip(self, db_pool, search), fields(supplier_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let db = db_pool.as_ref();

        let current = supplier::Entity::find_by_id(self.id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", self.id)))?;
        let mut active = current.clone().into_active_model();

        if let Some(name) = self.name.as_deref().map(str::trim) {
            if name != current.name {
                let slug = unique_slug::<supplier::Entity, _>(
                    db,
                    supplier::Column::Slug,
                    supplier::Column::Id,
                    &slugify(name),
                    Some(self.id),
                )
                .await?;
                active.name = Set(name.to_string());
                active.slug = Set(slug);
            }
        }
        if self.tax_id.is_some() {
            active.tax_id = Set(clean(&self.tax_id));
        }
        if self.address.is_some() {
            active.address = Set(clean(&self.address));
        }
        if self.locality.is_some() {
            active.locality = Set(clean(&self.locality));
        }

        let saved = if active.is_changed() {
            let saved = active
                .update(db)
                .await
                .map_err(|e| ServiceError::from_write_error(e, "Supplier"))?;
            search.index_supplier(db, saved.id).await?;
            info!(slug = %saved.slug, "Supplier updated");
            saved
        } else {
            current
        };
        Ok(saved)
    }
}
