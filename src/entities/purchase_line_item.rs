use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line of a purchase order. Its `detail` feeds the search index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "purchase_line_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_amount: Decimal,
    /// Free text as written on the order ("10 cajas", "1 unidad").
    pub quantity: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub detail: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::purchase::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Purchase,
}

impl Related<super::purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn describe(&self, purchase: &super::purchase::Model) -> String {
        format!(
            "{} (OC: {})",
            self.detail.as_deref().unwrap_or_default(),
            purchase.order_code().unwrap_or_else(|| "s/n".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn line(detail: Option<&str>) -> Model {
        Model {
            id: 3,
            purchase_id: 7,
            unit_amount: dec!(12.50),
            quantity: Some("10 cajas".into()),
            detail: detail.map(str::to_string),
        }
    }

    fn purchase(order_number: Option<i32>) -> super::super::purchase::Model {
        super::super::purchase::Model {
            id: 7,
            order_number,
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            amount: dec!(125.00),
            supply_reference: None,
            supplier_id: 1,
            department_id: 2,
        }
    }

    #[test]
    fn describe_names_the_order_code() {
        assert_eq!(
            line(Some("gasas estériles")).describe(&purchase(Some(15))),
            "gasas estériles (OC: 15/2024)"
        );
    }

    #[test]
    fn describe_without_code_or_detail() {
        assert_eq!(line(None).describe(&purchase(None)), " (OC: s/n)");
    }
}
