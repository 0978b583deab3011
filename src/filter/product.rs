//! Product listing filter.

use crate::filter::Pagination;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Filter for listing, counting and aggregating products.
///
/// `in_stock` and `low_stock` are tri-valued: `None` emits nothing, while
/// `Some(_)` emits the fixed compound predicates defined alongside
/// [`crate::repo::ProductRepo`] (out-of-stock and low-stock are disjoint
/// sets by construction).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Substring match over `name`, `sku` and `description`.
    pub search: Option<String>,

    // Scalar equality
    pub category_id: Option<Uuid>,
    pub sku: Option<String>,

    // Set membership
    pub ids: Vec<Uuid>,

    // Ranges
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,

    // Tri-valued booleans
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_digital: Option<bool>,
    pub in_stock: Option<bool>,
    pub low_stock: Option<bool>,

    // Sort + pagination
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}
