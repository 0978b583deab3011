//! Order listing filter.

use crate::filter::Pagination;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Filter for listing, counting and aggregating orders.
///
/// Predicate emission order is fixed (search, scalar equality, sets, ranges,
/// booleans) so parameter indices are deterministic; see
/// [`crate::repo::OrderRepo`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    /// Substring match over the searchable columns (`order_number`).
    pub search: Option<String>,

    // Scalar equality
    pub customer_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub currency: Option<String>,

    // Set membership
    pub ids: Vec<Uuid>,
    pub status: Vec<String>,
    pub payment_status: Vec<String>,
    pub priority: Vec<String>,
    pub shipping_method: Vec<String>,

    // Ranges
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    /// Inclusive `order_date` window.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,

    // Sort + pagination
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}
