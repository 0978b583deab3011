//! Product record.

use crate::entity::FromRow;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A sellable product.
///
/// Stock predicates over this record:
/// - low stock: `track_inventory && 0 < stock_quantity <= min_stock_level`
/// - out of stock: `track_inventory && stock_quantity <= 0 && !allow_backorder`
/// - overstock: `max_stock_level` set and exceeded
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub track_inventory: bool,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
    pub max_stock_level: Option<i32>,
    pub allow_backorder: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_digital: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Product {
    fn from_row(row: &Row) -> Result<Self, StoreError> {
        Ok(Product {
            id: row.try_get("id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category_id: row.try_get("category_id")?,
            price: row.try_get("price")?,
            cost: row.try_get("cost")?,
            weight: row.try_get("weight")?,
            length: row.try_get("length")?,
            width: row.try_get("width")?,
            height: row.try_get("height")?,
            track_inventory: row.try_get("track_inventory")?,
            stock_quantity: row.try_get("stock_quantity")?,
            min_stock_level: row.try_get("min_stock_level")?,
            max_stock_level: row.try_get("max_stock_level")?,
            allow_backorder: row.try_get("allow_backorder")?,
            is_active: row.try_get("is_active")?,
            is_featured: row.try_get("is_featured")?,
            is_digital: row.try_get("is_digital")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
