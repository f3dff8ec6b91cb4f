use chrono::Datelike;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A purchase order (compra) placed by a department with a supplier.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub order_number: Option<i32>,
    pub date: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    #[schema(value_type = String, example = "1500.00")]
    pub amount: Decimal,
    pub supply_reference: Option<String>,
    pub supplier_id: i64,
    pub department_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Supplier,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Department,
    #[sea_orm(has_many = "super::purchase_line_item::Entity")]
    LineItems,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::purchase_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Purchase order code as printed on the documents: `number/year`.
    pub fn order_code(&self) -> Option<String> {
        Some(format!("{}/{}", self.order_number?, self.date?.year()))
    }

    /// Canonical path of the purchase page, when number and date are known.
    pub fn url_path(&self) -> Option<String> {
        Some(format!("/compras/{}/{}", self.date?.year(), self.order_number?))
    }

    pub fn describe(
        &self,
        department: &super::department::Model,
        supplier: &super::supplier::Model,
    ) -> String {
        format!("{} compra a {} por ${:.2}", department, supplier, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn purchase() -> Model {
        Model {
            id: 7,
            order_number: Some(1234),
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            amount: dec!(1000.00),
            supply_reference: Some("S-99".into()),
            supplier_id: 1,
            department_id: 2,
        }
    }

    #[test]
    fn order_code_joins_number_and_year() {
        assert_eq!(purchase().order_code().as_deref(), Some("1234/2024"));
        assert_eq!(purchase().url_path().as_deref(), Some("/compras/2024/1234"));
    }

    #[test]
    fn order_code_requires_number_and_date() {
        let mut undated = purchase();
        undated.date = None;
        assert_eq!(undated.order_code(), None);

        let mut unnumbered = purchase();
        unnumbered.order_number = None;
        assert_eq!(unnumbered.url_path(), None);
    }

    #[test]
    fn describe_mentions_both_parties() {
        let department = super::super::department::Model {
            id: 2,
            name: "Salud".into(),
            slug: "salud".into(),
        };
        let supplier = super::super::supplier::Model {
            id: 1,
            name: "ACME".into(),
            tax_id: None,
            address: None,
            locality: None,
            slug: "acme".into(),
        };
        assert_eq!(
            purchase().describe(&department, &supplier),
            "Salud compra a ACME por $1000.00"
        );
    }
}
