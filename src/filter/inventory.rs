//! Inventory and inventory-transaction listing filters.

use crate::filter::Pagination;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Filter for listing and counting per-(product, warehouse) inventory rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryFilter {
    // Scalar equality
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,

    // Set membership
    pub product_ids: Vec<Uuid>,
    pub warehouse_ids: Vec<Uuid>,

    /// `Some(true)` restricts to rows at or below their reorder level.
    pub below_reorder: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}

/// Filter for listing and counting inventory transactions.
///
/// `is_approved`/`is_pending` are tri-valued; a transaction is pending iff
/// `approved_at` is null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryTransactionFilter {
    // Scalar equality
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub created_by: Option<Uuid>,

    // Set membership
    pub transaction_types: Vec<String>,

    // Ranges
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,

    // Tri-valued booleans
    pub is_approved: Option<bool>,
    pub is_pending: Option<bool>,

    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[serde(flatten)]
    pub paging: Pagination,
}
