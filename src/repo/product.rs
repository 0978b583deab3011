//! Product repository: filtered listing, stock predicates, stats.

use crate::entity::stats::ProductStats;
use crate::entity::{rows_to_vec, FromRow, Product};
use crate::error::StoreError;
use crate::executor::DbExecutor;
use crate::filter::ProductFilter;
use crate::sql::{SortEntity, SqlBuilder, SqlValue};
use uuid::Uuid;

const COLUMNS: &str = "id, sku, name, description, category_id, price, cost, weight, length, \
                       width, height, track_inventory, stock_quantity, min_stock_level, \
                       max_stock_level, allow_backorder, is_active, is_featured, is_digital, \
                       created_at, updated_at";

const SEARCHABLE: &[&str] = &["name", "sku", "description"];

// Fixed compound predicates for the tri-valued stock booleans. Low-stock
// requires a positive quantity, so low-stock and out-of-stock are disjoint.
const IN_STOCK: &str =
    "(NOT track_inventory OR stock_quantity > 0 OR allow_backorder = true)";
const OUT_OF_STOCK: &str =
    "(track_inventory = true AND stock_quantity <= 0 AND allow_backorder = false)";
const LOW_STOCK: &str =
    "(track_inventory = true AND stock_quantity <= min_stock_level AND stock_quantity > 0)";
const NOT_LOW_STOCK: &str =
    "NOT (track_inventory = true AND stock_quantity <= min_stock_level AND stock_quantity > 0)";

const STATS_PROJECTION: &str = "COUNT(*) AS total_products, \
     COUNT(*) FILTER (WHERE is_active) AS active_products, \
     COUNT(*) FILTER (WHERE is_featured) AS featured_products, \
     COUNT(*) FILTER (WHERE is_digital) AS digital_products, \
     COUNT(*) FILTER (WHERE track_inventory AND stock_quantity <= min_stock_level \
                        AND stock_quantity > 0) AS low_stock, \
     COUNT(*) FILTER (WHERE track_inventory AND stock_quantity <= 0 \
                        AND NOT allow_backorder) AS out_of_stock, \
     COUNT(*) FILTER (WHERE max_stock_level IS NOT NULL \
                        AND stock_quantity > max_stock_level) AS overstock, \
     AVG(price) AS average_price, \
     SUM(price * stock_quantity) AS total_stock_value";

pub struct ProductRepo;

impl ProductRepo {
    fn apply_filter(b: &mut SqlBuilder, filter: &ProductFilter) {
        if let Some(search) = filter.search.as_deref() {
            b.and_search(SEARCHABLE, search);
        }
        if let Some(category_id) = filter.category_id {
            b.and_eq("category_id", SqlValue::from(category_id));
        }
        if let Some(sku) = &filter.sku {
            b.and_eq("sku", SqlValue::from(sku.clone()));
        }
        b.and_in(
            "id",
            filter.ids.iter().map(|id| SqlValue::from(*id)).collect(),
        );
        if let Some(min_price) = filter.min_price {
            b.and_gte("price", SqlValue::from(min_price));
        }
        if let Some(max_price) = filter.max_price {
            b.and_lte("price", SqlValue::from(max_price));
        }
        if let Some(active) = filter.is_active {
            b.and_eq("is_active", SqlValue::from(active));
        }
        if let Some(featured) = filter.is_featured {
            b.and_eq("is_featured", SqlValue::from(featured));
        }
        if let Some(digital) = filter.is_digital {
            b.and_eq("is_digital", SqlValue::from(digital));
        }
        match filter.in_stock {
            Some(true) => b.and_raw(IN_STOCK),
            Some(false) => b.and_raw(OUT_OF_STOCK),
            None => {}
        }
        match filter.low_stock {
            Some(true) => b.and_raw(LOW_STOCK),
            Some(false) => b.and_raw(NOT_LOW_STOCK),
            None => {}
        }
    }

    pub fn list(db: &impl DbExecutor, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut b = SqlBuilder::select(COLUMNS, "products");
        Self::apply_filter(&mut b, filter);
        b.order_by(
            SortEntity::Products,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count(db: &impl DbExecutor, filter: &ProductFilter) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("products");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    /// Summary stats sharing the listing filter's predicate body.
    pub fn stats(db: &impl DbExecutor, filter: &ProductFilter) -> Result<ProductStats, StoreError> {
        let mut b = SqlBuilder::select(STATS_PROJECTION, "products");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        ProductStats::from_row(&row)
    }

    pub fn get_by_id(db: &impl DbExecutor, id: Uuid) -> Result<Product, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COLUMNS} FROM products WHERE id = $1"),
                &[&id],
            )?
            .ok_or_else(|| StoreError::not_found("product"))?;
        Product::from_row(&row)
    }

    pub fn get_by_sku(db: &impl DbExecutor, sku: &str) -> Result<Product, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {COLUMNS} FROM products WHERE sku = $1"),
                &[&sku],
            )?
            .ok_or_else(|| StoreError::not_found("product"))?;
        Product::from_row(&row)
    }

    /// Products in the low-stock band: tracking inventory, above zero, at or
    /// below their minimum. Out-of-stock rows are not low-stock.
    pub fn get_low_stock(db: &impl DbExecutor, limit: i64) -> Result<Vec<Product>, StoreError> {
        let rows = db.query_all(
            &format!(
                "SELECT {COLUMNS} FROM products WHERE {LOW_STOCK} \
                 ORDER BY stock_quantity ASC LIMIT $1"
            ),
            &[&limit],
        )?;
        rows_to_vec(&rows)
    }

    /// Substring search over name, sku and description.
    pub fn search(
        db: &impl DbExecutor,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Product>, StoreError> {
        let filter = ProductFilter {
            search: Some(query.to_string()),
            paging: crate::filter::Pagination::offset(limit, 0),
            ..Default::default()
        };
        Self::list(db, &filter)
    }

    /// Adjust the denormalised `stock_quantity` counter on the product row.
    pub fn adjust_stock_quantity(
        db: &impl DbExecutor,
        id: Uuid,
        delta: i32,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE products SET stock_quantity = stock_quantity + $1, updated_at = NOW() \
             WHERE id = $2",
            &[&delta, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("product"));
        }
        Ok(())
    }

    pub fn set_active(db: &impl DbExecutor, id: Uuid, active: bool) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE products SET is_active = $1, updated_at = NOW() WHERE id = $2",
            &[&active, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("product"));
        }
        Ok(())
    }
}
