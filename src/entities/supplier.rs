use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A vendor the government buys from (proveedor).
///
/// `slug` is derived from `name` by the supplier commands; the text-search
/// vector lives in a `search_index` column that is not part of the model and
/// is maintained by the search engine.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique, column_type = "Text")]
    pub name: String,
    /// CUIT
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub locality: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchases,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Canonical path of the supplier page.
    pub fn url_path(&self) -> String {
        format!("/proveedores/{}", self.slug)
    }

    /// Text indexed for full-text search: name, address and locality.
    pub fn search_text(&self) -> String {
        search_text(&self.name, self.address.as_deref(), self.locality.as_deref())
    }
}

pub(crate) fn search_text(name: &str, address: Option<&str>, locality: Option<&str>) -> String {
    [Some(name), address, locality]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
