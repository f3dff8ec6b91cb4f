use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Query as SeaQuery, SelectStatement},
    ColumnTrait, Condition,
};

use crate::entities::{department, purchase, supplier};

/// Extra restrictions on the purchases that feed a ranking or total.
///
/// Every set field narrows the result; `extra` accepts any condition over
/// the `purchases` table for callers that need more.
#[derive(Debug, Clone, Default)]
pub struct PurchaseFilter {
    pub supplier_id: Option<i64>,
    pub supplier_slug: Option<String>,
    pub department_id: Option<i64>,
    pub department_slug: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub extra: Option<Condition>,
}

impl PurchaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn supplier(mut self, slug: impl Into<String>) -> Self {
        self.supplier_slug = Some(slug.into());
        self
    }

    pub fn supplier_id(mut self, id: i64) -> Self {
        self.supplier_id = Some(id);
        self
    }

    pub fn department(mut self, slug: impl Into<String>) -> Self {
        self.department_slug = Some(slug.into());
        self
    }

    pub fn department_id(mut self, id: i64) -> Self {
        self.department_id = Some(id);
        self
    }

    pub fn min_amount(mut self, amount: Decimal) -> Self {
        self.min_amount = Some(amount);
        self
    }

    pub fn max_amount(mut self, amount: Decimal) -> Self {
        self.max_amount = Some(amount);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.extra = Some(condition);
        self
    }

    /// `None` when no field is set, so an empty filter adds no `WHERE`.
    pub fn condition(&self) -> Option<Condition> {
        let mut condition = Condition::all();
        if let Some(id) = self.supplier_id {
            condition = condition.add(purchase::Column::SupplierId.eq(id));
        }
        if let Some(slug) = &self.supplier_slug {
            condition = condition.add(
                purchase::Column::SupplierId.in_subquery(id_by_slug::<supplier::Entity, _, _>(
                    supplier::Column::Id,
                    supplier::Column::Slug,
                    slug,
                )),
            );
        }
        if let Some(id) = self.department_id {
            condition = condition.add(purchase::Column::DepartmentId.eq(id));
        }
        if let Some(slug) = &self.department_slug {
            condition = condition.add(
                purchase::Column::DepartmentId.in_subquery(
                    id_by_slug::<department::Entity, _, _>(
                        department::Column::Id,
                        department::Column::Slug,
                        slug,
                    ),
                ),
            );
        }
        if let Some(min) = self.min_amount {
            condition = condition.add(purchase::Column::Amount.gte(min));
        }
        if let Some(max) = self.max_amount {
            condition = condition.add(purchase::Column::Amount.lte(max));
        }
        if let Some(extra) = &self.extra {
            condition = condition.add(extra.clone());
        }
        (!condition.is_empty()).then_some(condition)
    }
}

fn id_by_slug<E, I, S>(id: I, slug_column: S, slug: &str) -> SelectStatement
where
    E: sea_orm::EntityTrait + Default,
    I: ColumnTrait,
    S: ColumnTrait,
{
    SeaQuery::select()
        .column(id)
        .from(E::default())
        .and_where(slug_column.eq(slug))
        .to_owned()
}
