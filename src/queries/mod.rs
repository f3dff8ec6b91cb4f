//! Read-side query objects.

use crate::{entities::purchase, errors::ServiceError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QuerySelect, QueryTrait,
};
use std::collections::HashMap;

pub mod department_queries;
pub mod filters;
pub mod period;
pub mod purchase_queries;
pub mod supplier_queries;

pub use department_queries::{DepartmentBySlugQuery, DepartmentTotal, DepartmentsBySpendQuery};
pub use filters::PurchaseFilter;
pub use period::Period;
pub use purchase_queries::{
    PurchaseByOrderCodeQuery, PurchaseDetail, PurchasesInPeriodQuery, SearchPurchasesQuery,
    TotalForPeriodQuery,
};
pub use supplier_queries::{SupplierBySlugQuery, SupplierTotal, SuppliersByPurchasesQuery};

/// Rounds a sum to cents and fixes its scale, so `1500` and `1500.0`
/// read back from different backends both render as `1500.00`.
pub(crate) fn money(value: Decimal) -> Decimal {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value
}

#[derive(Debug, FromQueryResult)]
struct KeyedAmount {
    key: i64,
    amount: Decimal,
}

/// Sums purchase amounts in `period` per value of `key`, adding in `Decimal`.
///
/// Backends without `numeric` hand amounts back as f64 and would sum them
/// in f64 as well, losing cents once a total passes 15 significant digits.
/// Every stored amount has at most two decimals, so each row is rounded
/// back to cents before it is added.
pub(crate) async fn decimal_sums(
    db: &DatabaseConnection,
    period: &Period,
    filter: &PurchaseFilter,
    key: purchase::Column,
) -> Result<HashMap<i64, Decimal>, ServiceError> {
    let rows = purchase::Entity::find()
        .select_only()
        .column_as(key, "key")
        .column_as(purchase::Column::Amount, "amount")
        .filter(period.condition())
        .apply_if(filter.condition(), |query, condition| query.filter(condition))
        .into_model::<KeyedAmount>()
        .all(db)
        .await?;

    let mut sums: HashMap<i64, Decimal> = HashMap::new();
    for row in rows {
        *sums.entry(row.key).or_default() += row.amount.round_dp(2);
    }
    Ok(sums)
}

/// Trait representing a generic asynchronous query.
#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    /// Executes the query using the provided database pool.
    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(dec!(1500)).to_string(), "1500.00");
        assert_eq!(money(dec!(0.125)).to_string(), "0.12");
        assert_eq!(money(Decimal::ZERO).to_string(), "0.00");
    }
}
