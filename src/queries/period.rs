use chrono::{Datelike, Local, NaiveDate};
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::purchase;

/// An inclusive range of calendar days over `purchases.date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Fills missing bounds: start defaults to the first day of `today`'s
    /// month, end to `today`. An inverted range is kept as given and simply
    /// matches nothing.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        Self {
            start: start.unwrap_or_else(|| first_of_month(today)),
            end: end.unwrap_or(today),
        }
    }

    /// [`Period::resolve`] against the local clock, read at call time.
    pub fn resolve_now(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self::resolve(start, end, Local::now().date_naive())
    }

    /// The month-to-date period.
    pub fn current() -> Self {
        Self::resolve_now(None, None)
    }

    /// The whole calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        let start = first_of_month(day);
        let next = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
        };
        let end = next.and_then(|d| d.pred_opt()).unwrap_or(start);
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Purchases dated within the period. Undated purchases never match.
    pub fn condition(&self) -> Condition {
        Condition::all()
            .add(purchase::Column::Date.gte(self.start))
            .add(purchase::Column::Date.lte(self.end))
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}
