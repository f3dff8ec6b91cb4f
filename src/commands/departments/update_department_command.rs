use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    commands::{validate_not_blank, Command},
    db::DbPool,
    entities::department,
    errors::ServiceError,
    search::TextSearchEngine,
    slug::{slugify, unique_slug},
};

/// Renames a department. The slug and search vector follow the new name.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentCommand {
    #[serde(skip)]
    pub id: i64,
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: String,
}

#[async_trait]
impl Command for UpdateDepartmentCommand {
    type Result = department::Model;

    #[instrument(skip(self, db_pool, search), fields(department_id = self.id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        let db = db_pool.as_ref();

        let current = department::Entity::find_by_id(self.id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Department {} not found", self.id)))?;

        let name = self.name.trim();
        if name == current.name {
            return Ok(current);
        }

        let slug = unique_slug::<department::Entity, _>(
            db,
            department::Column::Slug,
            department::Column::Id,
            &slugify(name),
            Some(self.id),
        )
        .await?;

        let mut active = current.into_active_model();
        active.name = Set(name.to_string());
        active.slug = Set(slug);
        let saved = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_write_error(e, "Department"))?;

        search.index_department(db, saved.id).await?;
        info!(slug = %saved.slug, "Department renamed");
        Ok(saved)
    }
}
