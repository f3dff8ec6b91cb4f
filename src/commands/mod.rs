use crate::{db::DbPool, errors::ServiceError, search::TextSearchEngine};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DbBackend;
use std::sync::Arc;
use validator::ValidationError;

/// Command trait for implementing the Command Pattern
///
/// A command validates its input, writes through `db_pool` and keeps the
/// derived search vectors current through `search`.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        search: Arc<dyn TextSearchEngine>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod departments;
pub mod purchases;
pub mod search;
pub mod suppliers;

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Amounts are `numeric(19, 2)`: not negative, at most two decimals and
/// at most 17 integer digits.
pub(crate) fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("negative_amount");
        err.message = Some("amount must not be negative".into());
        return Err(err);
    }
    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("amount_scale");
        err.message = Some("amount must have at most 2 decimals".into());
        return Err(err);
    }
    if value.trunc().abs() >= Decimal::from(100_000_000_000_000_000_i64) {
        let mut err = ValidationError::new("amount_precision");
        err.message = Some("amount must have at most 17 integer digits".into());
        return Err(err);
    }
    Ok(())
}

/// Largest amount a backend without `numeric` (SQLite stores REAL) keeps
/// exact to the cent: 15 significant digits.
pub const MAX_REAL_AMOUNT: Decimal = dec!(9999999999999.99);

/// Rejects amounts the backend cannot store exactly.
pub(crate) fn check_storable_amount(
    backend: DbBackend,
    field: &str,
    value: Decimal,
) -> Result<(), ServiceError> {
    if backend != DbBackend::Postgres && value > MAX_REAL_AMOUNT {
        return Err(ServiceError::InvalidInput(format!(
            "{} {} exceeds {}, the largest amount this database stores exactly",
            field, value, MAX_REAL_AMOUNT
        )));
    }
    Ok(())
}

/// Trims and drops empty optional text.
pub(crate) fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
