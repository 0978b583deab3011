//! Identifier whitelist.
//!
//! Bind parameters cannot carry identifiers, so a user-supplied sort column
//! has to be interpolated into SQL text. This module is the only gate
//! through which such text may pass: a fixed per-entity allow-list for
//! columns, and a two-token set for the direction. Everything else the user
//! sends is bound as a parameter by the builder.

use crate::error::StoreError;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// The listable entities the query builder serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortEntity {
    Orders,
    Products,
    Categories,
    Customers,
    Companies,
    Inventory,
    InventoryTransactions,
    EmailVerifications,
}

impl SortEntity {
    /// Table name for the entity. Compile-time constant, never user input.
    pub fn table(self) -> &'static str {
        match self {
            SortEntity::Orders => "orders",
            SortEntity::Products => "products",
            SortEntity::Categories => "product_categories",
            SortEntity::Customers => "customers",
            SortEntity::Companies => "companies",
            SortEntity::Inventory => "inventory",
            SortEntity::InventoryTransactions => "inventory_transactions",
            SortEntity::EmailVerifications => "email_verifications",
        }
    }

    /// Columns a caller may sort by.
    pub fn sortable_columns(self) -> &'static [&'static str] {
        match self {
            SortEntity::Orders => &[
                "order_number",
                "order_date",
                "status",
                "payment_status",
                "subtotal",
                "total_amount",
                "customer_id",
                "currency",
                "created_at",
                "updated_at",
            ],
            SortEntity::Products => &[
                "name",
                "sku",
                "price",
                "cost",
                "stock_quantity",
                "category_id",
                "is_active",
                "is_featured",
                "created_at",
                "updated_at",
            ],
            SortEntity::Categories => &[
                "name",
                "sort_order",
                "level",
                "path",
                "created_at",
                "updated_at",
            ],
            SortEntity::Customers => &[
                "first_name",
                "last_name",
                "email",
                "is_active",
                "created_at",
                "updated_at",
            ],
            SortEntity::Companies => &["name", "is_active", "created_at", "updated_at"],
            SortEntity::Inventory => &[
                "product_id",
                "warehouse_id",
                "quantity_on_hand",
                "quantity_reserved",
                "last_count_date",
                "updated_at",
            ],
            SortEntity::InventoryTransactions => &[
                "product_id",
                "warehouse_id",
                "transaction_type",
                "quantity",
                "approved_at",
                "created_at",
            ],
            SortEntity::EmailVerifications => &["token_type", "expires_at", "created_at"],
        }
    }

    /// Default ORDER BY clause used when the caller did not pick a column.
    pub fn default_order_by(self) -> &'static str {
        match self {
            SortEntity::Orders => "order_date DESC",
            SortEntity::Products => "created_at DESC",
            SortEntity::Categories => "sort_order ASC, name ASC",
            SortEntity::Customers => "created_at DESC",
            SortEntity::Companies => "name ASC",
            SortEntity::Inventory => "updated_at DESC",
            SortEntity::InventoryTransactions => "created_at DESC",
            SortEntity::EmailVerifications => "created_at DESC",
        }
    }

    /// Default sort column applied when the caller picked a direction but
    /// no column.
    pub fn default_sort_column(self) -> &'static str {
        match self {
            SortEntity::Orders => "order_date",
            SortEntity::Products => "created_at",
            SortEntity::Categories => "sort_order",
            SortEntity::Customers => "created_at",
            SortEntity::Companies => "name",
            SortEntity::Inventory => "updated_at",
            SortEntity::InventoryTransactions => "created_at",
            SortEntity::EmailVerifications => "created_at",
        }
    }

    /// Secondary ORDER BY term appended when sorting falls back to the
    /// default column, so equal keys keep a stable order. Only categories
    /// need one: sibling rows share a `sort_order` value routinely.
    pub fn tie_break(self) -> Option<&'static str> {
        match self {
            SortEntity::Categories => Some("name ASC"),
            _ => None,
        }
    }

    /// Default direction applied when the caller picked a column but no
    /// direction.
    pub fn default_sort_order(self) -> SortOrder {
        match self {
            SortEntity::Orders | SortEntity::Products => SortOrder::Desc,
            SortEntity::Categories | SortEntity::Companies => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    /// Validate a user-supplied sort column against the allow-list.
    pub fn validate_column(self, name: &str) -> Result<&'static str, StoreError> {
        match WHITELIST.get(&self).and_then(|set| set.get(name)) {
            Some(col) => Ok(col),
            None => Err(StoreError::InvalidSortColumn(name.to_string())),
        }
    }
}

// HashSet membership so validation stays O(1) as allow-lists grow.
static WHITELIST: Lazy<HashMap<SortEntity, HashSet<&'static str>>> = Lazy::new(|| {
    let entities = [
        SortEntity::Orders,
        SortEntity::Products,
        SortEntity::Categories,
        SortEntity::Customers,
        SortEntity::Companies,
        SortEntity::Inventory,
        SortEntity::InventoryTransactions,
        SortEntity::EmailVerifications,
    ];
    entities
        .into_iter()
        .map(|e| (e, e.sortable_columns().iter().copied().collect()))
        .collect()
});

/// Sort direction token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a user token. Accepts `asc`/`desc` in any case, rejects
    /// everything else.
    pub fn parse(token: &str) -> Result<Self, StoreError> {
        match token.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(StoreError::InvalidSortOrder(token.to_string())),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}
