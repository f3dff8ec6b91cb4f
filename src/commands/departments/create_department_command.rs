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
    entities::department,
    errors::ServiceError,
    search::TextSearchEngine,
    slug::{slugify, unique_slug},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentCommand {
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 64))]
    pub slug: Option<String>,
}

impl CreateDepartmentCommand {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
        }
    }
}

#[async_trait]
impl Command for CreateDepartmentCommand {
    type Result = department::Model;

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
        let slug = unique_slug::<department::Entity, _>(
            db,
            department::Column::Slug,
            department::Column::Id,
            &base,
            None,
        )
        .await?;

        let saved = department::ActiveModel {
            name: Set(name),
            slug: Set(slug),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_error(e, "Department"))?;

        search.index_department(db, saved.id).await?;

        info!(department_id = saved.id, slug = %saved.slug, "Department created");
        Ok(saved)
    }
}
