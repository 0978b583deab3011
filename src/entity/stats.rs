//! Aggregate record shapes produced by the statistics queries.
//!
//! These are read-only projections; every numeric field is computed in SQL
//! and only passed through here.

use crate::entity::FromRow;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Order summary. Revenue-like figures exclude CANCELLED and REFUNDED
/// orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub processing_orders: i64,
    pub shipped_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    pub total_revenue: Decimal,
    pub average_order_value: Option<Decimal>,
    pub first_order_date: Option<DateTime<Utc>>,
    pub last_order_date: Option<DateTime<Utc>>,
}

impl FromRow for OrderStats {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(OrderStats {
            total_orders: row.try_get("total_orders")?,
            pending_orders: row.try_get("pending_orders")?,
            processing_orders: row.try_get("processing_orders")?,
            shipped_orders: row.try_get("shipped_orders")?,
            delivered_orders: row.try_get("delivered_orders")?,
            cancelled_orders: row.try_get("cancelled_orders")?,
            total_revenue: row.try_get("total_revenue")?,
            average_order_value: row.try_get("average_order_value")?,
            first_order_date: row.try_get("first_order_date")?,
            last_order_date: row.try_get("last_order_date")?,
        })
    }
}

/// One bucket of the revenue-by-period rollup.
#[derive(Debug, Clone, Serialize)]
pub struct RevenuePeriod {
    /// Formatted period label, e.g. `2024-06` for a monthly rollup.
    pub period: String,
    pub order_count: i64,
    pub revenue: Decimal,
}

impl FromRow for RevenuePeriod {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(RevenuePeriod {
            period: row.try_get("period")?,
            order_count: row.try_get("order_count")?,
            revenue: row.try_get("revenue")?,
        })
    }
}

/// One entry of the top-N-customers-by-revenue rollup.
///
/// `customer_name` and `customer_email` are distinct outputs.
#[derive(Debug, Clone, Serialize)]
pub struct TopCustomer {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub order_count: i64,
    pub total_revenue: Decimal,
}

impl FromRow for TopCustomer {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(TopCustomer {
            customer_id: row.try_get("customer_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            order_count: row.try_get("order_count")?,
            total_revenue: row.try_get("total_revenue")?,
        })
    }
}

/// Product summary with the three stock buckets. Low-stock and out-of-stock
/// are disjoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProductStats {
    pub total_products: i64,
    pub active_products: i64,
    pub featured_products: i64,
    pub digital_products: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub overstock: i64,
    pub average_price: Option<Decimal>,
    pub total_stock_value: Option<Decimal>,
}

impl FromRow for ProductStats {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(ProductStats {
            total_products: row.try_get("total_products")?,
            active_products: row.try_get("active_products")?,
            featured_products: row.try_get("featured_products")?,
            digital_products: row.try_get("digital_products")?,
            low_stock: row.try_get("low_stock")?,
            out_of_stock: row.try_get("out_of_stock")?,
            overstock: row.try_get("overstock")?,
            average_price: row.try_get("average_price")?,
            total_stock_value: row.try_get("total_stock_value")?,
        })
    }
}

/// Inventory summary across all (product, warehouse) rows in scope.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryStats {
    pub total_rows: i64,
    pub total_on_hand: i64,
    pub total_reserved: i64,
    pub total_available: i64,
    pub below_reorder: i64,
}

impl FromRow for InventoryStats {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(InventoryStats {
            total_rows: row.try_get("total_rows")?,
            total_on_hand: row.try_get("total_on_hand")?,
            total_reserved: row.try_get("total_reserved")?,
            total_available: row.try_get("total_available")?,
            below_reorder: row.try_get("below_reorder")?,
        })
    }
}

/// Customer summary.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerStats {
    pub total_customers: i64,
    pub active_customers: i64,
    pub with_company: i64,
}

impl FromRow for CustomerStats {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(CustomerStats {
            total_customers: row.try_get("total_customers")?,
            active_customers: row.try_get("active_customers")?,
            with_company: row.try_get("with_company")?,
        })
    }
}

/// Per-token-type verification summary; returned as a map keyed by
/// `token_type` so multiple types never collapse into one row.
#[derive(Debug, Clone, Serialize)]
pub struct TokenTypeStats {
    pub total: i64,
    pub used: i64,
    pub active: i64,
    pub expired: i64,
}
