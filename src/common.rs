/// Query-string types shared by the handlers and the CLI
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    errors::ServiceError,
    queries::{Period, PurchaseFilter},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date; blank input counts as absent.
pub fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|e| ServiceError::InvalidInput(format!("Invalid {} date '{}': {}", field, value, e))),
    }
}

/// Date window of a report. Missing bounds default to the current month so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodParams {
    /// First day included, `YYYY-MM-DD`
    pub desde: Option<String>,
    /// Last day included, `YYYY-MM-DD`
    pub hasta: Option<String>,
}

impl PeriodParams {
    pub fn period(&self) -> Result<Period, ServiceError> {
        let start = parse_date("desde", self.desde.as_deref())?;
        let end = parse_date("hasta", self.hasta.as_deref())?;
        Ok(Period::resolve_now(start, end))
    }
}

/// Supplier ranking parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplierRankingParams {
    pub desde: Option<String>,
    pub hasta: Option<String>,
    /// Only purchases of this department (slug)
    pub department: Option<String>,
    pub limit: Option<u64>,
}

impl SupplierRankingParams {
    pub fn period(&self) -> Result<Period, ServiceError> {
        PeriodParams {
            desde: self.desde.clone(),
            hasta: self.hasta.clone(),
        }
        .period()
    }

    pub fn filter(&self) -> PurchaseFilter {
        match &self.department {
            Some(slug) => PurchaseFilter::new().department(slug.clone()),
            None => PurchaseFilter::new(),
        }
    }
}

/// Department ranking parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentRankingParams {
    pub desde: Option<String>,
    pub hasta: Option<String>,
    /// Only purchases from this supplier (slug)
    pub supplier: Option<String>,
    pub limit: Option<u64>,
}

impl DepartmentRankingParams {
    pub fn period(&self) -> Result<Period, ServiceError> {
        PeriodParams {
            desde: self.desde.clone(),
            hasta: self.hasta.clone(),
        }
        .period()
    }

    pub fn filter(&self) -> PurchaseFilter {
        match &self.supplier {
            Some(slug) => PurchaseFilter::new().supplier(slug.clone()),
            None => PurchaseFilter::new(),
        }
    }
}

/// Full-text search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Query in `to_tsquery` syntax, e.g. `insumos & medicos`. An empty
    /// query is a syntax error, reported by the parser.
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub q: String,
    #[validate(range(min = 1))]
    pub limit: Option<u64>,
}
