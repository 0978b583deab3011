//! Inventory repository: the stock concurrency engine and the transaction
//! approval workflow.
//!
//! Every stock mutation is a single UPDATE whose WHERE clause encodes its
//! precondition, so the database's row lock serialises concurrent callers
//! and a failed precondition surfaces as zero rows affected. The engine
//! adds no locking of its own and promises nothing across distinct
//! `(product_id, warehouse_id)` rows.

use crate::entity::stats::InventoryStats;
use crate::entity::{
    rows_to_vec, FromRow, InventoryRow, InventoryTransaction, NewInventoryTransaction,
};
use crate::error::StoreError;
use crate::executor::{ClientExecutor, DbExecutor};
use crate::filter::{InventoryFilter, InventoryTransactionFilter};
use crate::sql::{SortEntity, SqlBuilder, SqlValue};
use uuid::Uuid;

const COLUMNS: &str = "id, product_id, warehouse_id, quantity_on_hand, quantity_reserved, \
                       reorder_level, min_stock, max_stock, average_cost, last_count_date, \
                       last_counted_by, updated_at, updated_by";

const TX_COLUMNS: &str = "id, product_id, warehouse_id, transaction_type, quantity, \
                          reference_type, reference_id, reason, unit_cost, total_cost, \
                          batch_number, serial_number, from_warehouse_id, to_warehouse_id, \
                          created_at, created_by, approved_at, approved_by";

const STATS_PROJECTION: &str = "COUNT(*) AS total_rows, \
     COALESCE(SUM(quantity_on_hand), 0)::BIGINT AS total_on_hand, \
     COALESCE(SUM(quantity_reserved), 0)::BIGINT AS total_reserved, \
     COALESCE(SUM(quantity_on_hand - quantity_reserved), 0)::BIGINT AS total_available, \
     COUNT(*) FILTER (WHERE quantity_on_hand - quantity_reserved <= reorder_level) \
       AS below_reorder";

pub struct InventoryRepo;

impl InventoryRepo {
    // ----- stock rows -----------------------------------------------------

    pub fn get(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<InventoryRow, StoreError> {
        let row = db
            .query_opt(
                &format!(
                    "SELECT {COLUMNS} FROM inventory \
                     WHERE product_id = $1 AND warehouse_id = $2"
                ),
                &[&product_id, &warehouse_id],
            )?
            .ok_or_else(|| StoreError::not_found("inventory"))?;
        InventoryRow::from_row(&row)
    }

    /// All warehouse rows for one product.
    pub fn get_for_product(
        db: &impl DbExecutor,
        product_id: Uuid,
    ) -> Result<Vec<InventoryRow>, StoreError> {
        let rows = db.query_all(
            &format!(
                "SELECT {COLUMNS} FROM inventory WHERE product_id = $1 \
                 ORDER BY warehouse_id"
            ),
            &[&product_id],
        )?;
        rows_to_vec(&rows)
    }

    fn apply_filter(b: &mut SqlBuilder, filter: &InventoryFilter) {
        if let Some(product_id) = filter.product_id {
            b.and_eq("product_id", SqlValue::from(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            b.and_eq("warehouse_id", SqlValue::from(warehouse_id));
        }
        b.and_in(
            "product_id",
            filter
                .product_ids
                .iter()
                .map(|id| SqlValue::from(*id))
                .collect(),
        );
        b.and_in(
            "warehouse_id",
            filter
                .warehouse_ids
                .iter()
                .map(|id| SqlValue::from(*id))
                .collect(),
        );
        match filter.below_reorder {
            Some(true) => {
                b.and_raw("quantity_on_hand - quantity_reserved <= reorder_level")
            }
            Some(false) => {
                b.and_raw("quantity_on_hand - quantity_reserved > reorder_level")
            }
            None => {}
        }
    }

    pub fn list(
        db: &impl DbExecutor,
        filter: &InventoryFilter,
    ) -> Result<Vec<InventoryRow>, StoreError> {
        let mut b = SqlBuilder::select(COLUMNS, "inventory");
        Self::apply_filter(&mut b, filter);
        b.order_by(
            SortEntity::Inventory,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count(db: &impl DbExecutor, filter: &InventoryFilter) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("inventory");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    pub fn stats(db: &impl DbExecutor, filter: &InventoryFilter) -> Result<InventoryStats, StoreError> {
        let mut b = SqlBuilder::select(STATS_PROJECTION, "inventory");
        Self::apply_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        InventoryStats::from_row(&row)
    }

    // ----- atomic stock mutations ----------------------------------------

    /// Relative adjustment of on-hand quantity. No lower bound: negative
    /// stock is permissible for corrections.
    pub fn adjust_stock(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: i32,
        user_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE inventory SET quantity_on_hand = quantity_on_hand + $1, \
             updated_at = NOW(), updated_by = $2 \
             WHERE product_id = $3 AND warehouse_id = $4",
            &[&delta, &user_id, &product_id, &warehouse_id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("inventory"));
        }
        Ok(())
    }

    /// Reserve `quantity` units. The availability check rides in the WHERE
    /// clause, so `available >= 0` survives arbitrary interleavings; zero
    /// rows affected means another caller got there first.
    pub fn reserve_stock(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> Result<(), StoreError> {
        if quantity <= 0 {
            return Err(StoreError::InvalidArgument(
                "reserve quantity must be positive".to_string(),
            ));
        }
        let affected = db.execute(
            "UPDATE inventory SET quantity_reserved = quantity_reserved + $1, \
             updated_at = NOW() \
             WHERE product_id = $2 AND warehouse_id = $3 \
               AND quantity_on_hand - quantity_reserved >= $1",
            &[&quantity, &product_id, &warehouse_id],
        )?;
        if affected == 0 {
            return Err(StoreError::InsufficientStock);
        }
        Ok(())
    }

    /// Release previously reserved units.
    pub fn release_stock(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
    ) -> Result<(), StoreError> {
        if quantity <= 0 {
            return Err(StoreError::InvalidArgument(
                "release quantity must be positive".to_string(),
            ));
        }
        let affected = db.execute(
            "UPDATE inventory SET quantity_reserved = quantity_reserved - $1, \
             updated_at = NOW() \
             WHERE product_id = $2 AND warehouse_id = $3 AND quantity_reserved >= $1",
            &[&quantity, &product_id, &warehouse_id],
        )?;
        if affected == 0 {
            return Err(StoreError::InsufficientReserved);
        }
        Ok(())
    }

    /// Set on-hand quantity to an absolute value.
    pub fn update_stock(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
        quantity: i32,
        user_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE inventory SET quantity_on_hand = $1, updated_at = NOW(), updated_by = $2 \
             WHERE product_id = $3 AND warehouse_id = $4",
            &[&quantity, &user_id, &product_id, &warehouse_id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("inventory"));
        }
        Ok(())
    }

    pub fn get_available_stock(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<i32, StoreError> {
        let row = db
            .query_opt(
                "SELECT quantity_on_hand - quantity_reserved AS available \
                 FROM inventory WHERE product_id = $1 AND warehouse_id = $2",
                &[&product_id, &warehouse_id],
            )?
            .ok_or_else(|| StoreError::not_found("inventory"))?;
        Ok(row.try_get("available")?)
    }

    /// Apply a batch of adjustments in one transaction; the first failure
    /// rolls the whole batch back.
    pub fn bulk_adjust_stock(
        db: &ClientExecutor,
        adjustments: &[(Uuid, Uuid, i32)],
        user_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let tx = db.begin()?;
        for (product_id, warehouse_id, delta) in adjustments {
            Self::adjust_stock(&tx, *product_id, *warehouse_id, *delta, user_id)?;
        }
        log::debug!("bulk adjusted {} inventory rows", adjustments.len());
        tx.commit()
    }

    /// Reserve across a batch of rows, all-or-nothing.
    pub fn bulk_reserve_stock(
        db: &ClientExecutor,
        reservations: &[(Uuid, Uuid, i32)],
    ) -> Result<(), StoreError> {
        let tx = db.begin()?;
        for (product_id, warehouse_id, quantity) in reservations {
            Self::reserve_stock(&tx, *product_id, *warehouse_id, *quantity)?;
        }
        log::debug!("bulk reserved across {} inventory rows", reservations.len());
        tx.commit()
    }

    /// Record a cycle count: set the counted absolute quantity and stamp
    /// the count metadata.
    pub fn update_cycle_count(
        db: &impl DbExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
        counted_quantity: i32,
        user_id: Uuid,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE inventory SET quantity_on_hand = $1, last_count_date = NOW(), \
             last_counted_by = $2, updated_at = NOW(), updated_by = $2 \
             WHERE product_id = $3 AND warehouse_id = $4",
            &[&counted_quantity, &user_id, &product_id, &warehouse_id],
        )?;
        if affected == 0 {
            return Err(StoreError::not_found("inventory"));
        }
        Ok(())
    }

    /// Reconcile on-hand stock to an audited absolute value. Runs in a
    /// transaction to leave room for a paired audit write.
    pub fn reconcile_stock(
        db: &ClientExecutor,
        product_id: Uuid,
        warehouse_id: Uuid,
        actual_quantity: i32,
        user_id: Uuid,
    ) -> Result<(), StoreError> {
        let tx = db.begin()?;
        Self::update_stock(&tx, product_id, warehouse_id, actual_quantity, Some(user_id))?;
        tx.commit()
    }

    // ----- inventory transactions ----------------------------------------

    pub fn create_transaction(
        db: &impl DbExecutor,
        input: &NewInventoryTransaction,
    ) -> Result<InventoryTransaction, StoreError> {
        let row = db.query_one(
            &format!(
                "INSERT INTO inventory_transactions \
                 (id, product_id, warehouse_id, transaction_type, quantity, reference_type, \
                  reference_id, reason, unit_cost, total_cost, batch_number, serial_number, \
                  from_warehouse_id, to_warehouse_id, created_at, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW(), $15) \
                 RETURNING {TX_COLUMNS}"
            ),
            &[
                &input.id,
                &input.product_id,
                &input.warehouse_id,
                &input.transaction_type.as_str(),
                &input.quantity,
                &input.reference_type,
                &input.reference_id,
                &input.reason,
                &input.unit_cost,
                &input.total_cost,
                &input.batch_number,
                &input.serial_number,
                &input.from_warehouse_id,
                &input.to_warehouse_id,
                &input.created_by,
            ],
        )?;
        InventoryTransaction::from_row(&row)
    }

    pub fn get_transaction(
        db: &impl DbExecutor,
        id: Uuid,
    ) -> Result<InventoryTransaction, StoreError> {
        let row = db
            .query_opt(
                &format!("SELECT {TX_COLUMNS} FROM inventory_transactions WHERE id = $1"),
                &[&id],
            )?
            .ok_or_else(|| StoreError::not_found("inventory transaction"))?;
        InventoryTransaction::from_row(&row)
    }

    fn apply_tx_filter(b: &mut SqlBuilder, filter: &InventoryTransactionFilter) {
        if let Some(product_id) = filter.product_id {
            b.and_eq("product_id", SqlValue::from(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            b.and_eq("warehouse_id", SqlValue::from(warehouse_id));
        }
        if let Some(reference_type) = &filter.reference_type {
            b.and_eq("reference_type", SqlValue::from(reference_type.clone()));
        }
        if let Some(reference_id) = filter.reference_id {
            b.and_eq("reference_id", SqlValue::from(reference_id));
        }
        if let Some(created_by) = filter.created_by {
            b.and_eq("created_by", SqlValue::from(created_by));
        }
        b.and_in(
            "transaction_type",
            filter
                .transaction_types
                .iter()
                .map(|t| SqlValue::from(t.clone()))
                .collect(),
        );
        if let Some(created_after) = filter.created_after {
            b.and_gte("created_at", SqlValue::from(created_after));
        }
        if let Some(created_before) = filter.created_before {
            b.and_lte("created_at", SqlValue::from(created_before));
        }
        match filter.is_approved {
            Some(true) => b.and_raw("approved_at IS NOT NULL"),
            Some(false) => b.and_raw("approved_at IS NULL"),
            None => {}
        }
        match filter.is_pending {
            Some(true) => b.and_raw("approved_at IS NULL"),
            Some(false) => b.and_raw("approved_at IS NOT NULL"),
            None => {}
        }
    }

    pub fn list_transactions(
        db: &impl DbExecutor,
        filter: &InventoryTransactionFilter,
    ) -> Result<Vec<InventoryTransaction>, StoreError> {
        let mut b = SqlBuilder::select(TX_COLUMNS, "inventory_transactions");
        Self::apply_tx_filter(&mut b, filter);
        b.order_by(
            SortEntity::InventoryTransactions,
            filter.sort_by.as_deref(),
            filter.sort_order.as_deref(),
        )?;
        b.paginate(&filter.paging);
        let (sql, params) = b.build();
        let rows = db.query_all(&sql, &SqlValue::borrow_all(&params))?;
        rows_to_vec(&rows)
    }

    pub fn count_transactions(
        db: &impl DbExecutor,
        filter: &InventoryTransactionFilter,
    ) -> Result<i64, StoreError> {
        let mut b = SqlBuilder::count("inventory_transactions");
        Self::apply_tx_filter(&mut b, filter);
        let (sql, params) = b.build();
        let row = db.query_one(&sql, &SqlValue::borrow_all(&params))?;
        Ok(row.try_get(0)?)
    }

    /// Pending transactions, oldest first.
    pub fn pending_transactions(
        db: &impl DbExecutor,
        limit: i64,
    ) -> Result<Vec<InventoryTransaction>, StoreError> {
        let rows = db.query_all(
            &format!(
                "SELECT {TX_COLUMNS} FROM inventory_transactions \
                 WHERE approved_at IS NULL ORDER BY created_at ASC LIMIT $1"
            ),
            &[&limit],
        )?;
        rows_to_vec(&rows)
    }

    // ----- approval workflow ---------------------------------------------

    /// Approve a pending transaction. Concurrent approvals race to a single
    /// winner; the loser observes zero rows affected.
    pub fn approve_transaction(
        db: &impl DbExecutor,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StoreError> {
        let affected = db.execute(
            "UPDATE inventory_transactions SET approved_at = NOW(), approved_by = $1 \
             WHERE id = $2 AND approved_at IS NULL",
            &[&user_id, &id],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFoundOrAlreadyApproved);
        }
        Ok(())
    }

    /// Reject a pending transaction, recording the reason. Transactional so
    /// a rejection side-record can join the write later.
    pub fn reject_transaction(
        db: &ClientExecutor,
        id: Uuid,
        user_id: Uuid,
        reason: &str,
    ) -> Result<(), StoreError> {
        let tx = db.begin()?;
        let affected = tx.execute(
            "UPDATE inventory_transactions SET approved_at = NOW(), approved_by = $1, \
             reason = $2 WHERE id = $3 AND approved_at IS NULL",
            &[&user_id, &reason, &id],
        )?;
        if affected == 0 {
            tx.rollback()?;
            return Err(StoreError::NotFoundOrAlreadyApproved);
        }
        tx.commit()
    }

    /// Approve every still-pending id in the set. Already-approved ids are
    /// skipped silently; returns how many rows were approved here.
    pub fn bulk_approve_transactions(
        db: &impl DbExecutor,
        ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut b = SqlBuilder::count("inventory_transactions");
        // Reuse only the IN-list rendering; the statement text is assembled
        // here because this is an UPDATE.
        b.and_in("id", ids.iter().map(|id| SqlValue::from(*id)).collect());
        let (sql, params) = b.build();
        let in_clause = sql
            .split_once("WHERE 1=1 AND ")
            .map(|(_, tail)| tail.to_string())
            .unwrap_or_default();

        let mut all_params: Vec<SqlValue> = vec![SqlValue::from(user_id)];
        all_params.extend(params);
        // Shift the IN-list placeholders by one to make room for $1.
        let shifted = shift_placeholders(&in_clause, 1);
        let affected = db.execute(
            &format!(
                "UPDATE inventory_transactions SET approved_at = NOW(), approved_by = $1 \
                 WHERE {shifted} AND approved_at IS NULL"
            ),
            &SqlValue::borrow_all(&all_params),
        )?;
        log::debug!("bulk approved {affected} of {} transactions", ids.len());
        Ok(affected)
    }
}

/// Renumber `$k` placeholders upward by `by`.
fn shift_placeholders(sql: &str, by: usize) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            if digits.is_empty() {
                out.push('$');
            } else {
                let n: usize = digits.parse().unwrap_or(0);
                out.push('$');
                out.push_str(&(n + by).to_string());
            }
        } else {
            out.push(c);
        }
    }
    out
}
