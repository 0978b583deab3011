//! Dynamic SQL builder.
//!
//! Builds a single `SELECT ... FROM ... WHERE 1=1 [AND <predicate>]*
//! [ORDER BY ...] [LIMIT $k] [OFFSET $m]` statement plus its ordered
//! parameter vector. Two rules hold throughout:
//!
//! - Every value derived from a filter is a bound parameter. Placeholders
//!   are `$1..$n`, dense and strictly left-to-right.
//! - Every identifier is either a compile-time constant (`&'static str`
//!   enforced at the API level) or has passed the whitelist in
//!   [`crate::sql::ident`].
//!
//! Repositories layer per-entity predicate functions on top of this; the
//! builder itself knows nothing about any entity.

use crate::error::StoreError;
use crate::filter::Pagination;
use crate::sql::ident::{SortEntity, SortOrder};
use crate::sql::value::SqlValue;
use std::fmt::Write as _;

/// Accumulates SQL text and bound parameters for one statement.
pub struct SqlBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    /// Start a row-projection query: `SELECT <projection> FROM <table> WHERE 1=1`.
    ///
    /// Both arguments must be compile-time constants; the `'static` bound is
    /// the enforcement.
    pub fn select(projection: &'static str, table: &'static str) -> Self {
        SqlBuilder {
            sql: format!("SELECT {projection} FROM {table} WHERE 1=1"),
            params: Vec::new(),
        }
    }

    /// Start a count query: `SELECT COUNT(*) FROM <table> WHERE 1=1`.
    pub fn count(table: &'static str) -> Self {
        Self::select("COUNT(*)", table)
    }

    /// Push a parameter and return its 1-based placeholder index.
    fn push(&mut self, value: SqlValue) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// `AND <col> = $k`
    pub fn and_eq(&mut self, col: &'static str, value: SqlValue) {
        let k = self.push(value);
        let _ = write!(self.sql, " AND {col} = ${k}");
    }

    /// `AND <col> >= $k`
    pub fn and_gte(&mut self, col: &'static str, value: SqlValue) {
        let k = self.push(value);
        let _ = write!(self.sql, " AND {col} >= ${k}");
    }

    /// `AND <col> <= $k`
    pub fn and_lte(&mut self, col: &'static str, value: SqlValue) {
        let k = self.push(value);
        let _ = write!(self.sql, " AND {col} <= ${k}");
    }

    /// `AND <col> IN ($k, $k+1, ...)`. An empty set emits nothing.
    pub fn and_in(&mut self, col: &'static str, values: Vec<SqlValue>) {
        if values.is_empty() {
            return;
        }
        let _ = write!(self.sql, " AND {col} IN (");
        for (i, value) in values.into_iter().enumerate() {
            let k = self.push(value);
            if i > 0 {
                self.sql.push_str(", ");
            }
            let _ = write!(self.sql, "${k}");
        }
        self.sql.push(')');
    }

    /// OR-group of `ILIKE` predicates over the entity's searchable columns,
    /// each bound to `%needle%`. An empty needle emits nothing.
    pub fn and_search(&mut self, cols: &[&'static str], needle: &str) {
        if needle.is_empty() || cols.is_empty() {
            return;
        }
        let pattern = format!("%{needle}%");
        self.sql.push_str(" AND (");
        for (i, col) in cols.iter().enumerate() {
            let k = self.push(SqlValue::Text(pattern.clone()));
            if i > 0 {
                self.sql.push_str(" OR ");
            }
            let _ = write!(self.sql, "{col} ILIKE ${k}");
        }
        self.sql.push(')');
    }

    /// `AND <predicate>` with no parameters. Reserved for fixed compound
    /// predicates (`parent_id IS NULL`, the stock compounds).
    pub fn and_raw(&mut self, predicate: &'static str) {
        let _ = write!(self.sql, " AND {predicate}");
    }

    /// `GROUP BY <clause>`
    pub fn group_by(&mut self, clause: &'static str) {
        let _ = write!(self.sql, " GROUP BY {clause}");
    }

    /// Emit ORDER BY from user sort tokens, validating both against the
    /// whitelist. With neither token the entity's default clause is used.
    pub fn order_by(
        &mut self,
        entity: SortEntity,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<(), StoreError> {
        if sort_by.is_none() && sort_order.is_none() {
            let _ = write!(self.sql, " ORDER BY {}", entity.default_order_by());
            return Ok(());
        }
        let col = match sort_by {
            Some(c) => entity.validate_column(c)?,
            None => entity.default_sort_column(),
        };
        let dir = match sort_order {
            Some(t) => SortOrder::parse(t)?,
            None => entity.default_sort_order(),
        };
        let _ = write!(self.sql, " ORDER BY {col} {}", dir.as_sql());
        // On the default column, keep the default clause's secondary term so
        // rows with equal keys stay in a stable order.
        if sort_by.is_none() {
            if let Some(tie) = entity.tie_break() {
                let _ = write!(self.sql, ", {tie}");
            }
        }
        Ok(())
    }

    /// Emit LIMIT/OFFSET. `limit == 0` suppresses both. A verbatim `offset`
    /// wins over a page-derived one.
    pub fn paginate(&mut self, p: &Pagination) {
        if p.limit <= 0 {
            return;
        }
        let k = self.push(SqlValue::BigInt(p.limit));
        let _ = write!(self.sql, " LIMIT ${k}");
        let offset = if p.offset > 0 {
            p.offset
        } else if p.page > 1 {
            (p.page - 1) * p.limit
        } else {
            return;
        };
        let k = self.push(SqlValue::BigInt(offset));
        let _ = write!(self.sql, " OFFSET ${k}");
    }

    /// Finish, yielding the SQL text and its ordered parameters.
    pub fn build(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }

    /// Current SQL text, for logging.
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_indices(sql: &str) -> Vec<usize> {
        let mut out = Vec::new();
        let bytes = sql.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'$' {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                if j > i + 1 {
                    out.push(sql[i + 1..j].parse().unwrap());
                }
                i = j;
            } else {
                i += 1;
            }
        }
        out
    }

    /// Placeholders must be a contiguous 1..n run in left-to-right order,
    /// matching the parameter vector's arity.
    fn assert_dense(sql: &str, params: &[SqlValue]) {
        let idx = placeholder_indices(sql);
        assert_eq!(idx, (1..=params.len()).collect::<Vec<_>>(), "sql: {sql}");
    }

    #[test]
    fn test_empty_filter_is_bare_select() {
        let (sql, params) = SqlBuilder::select("id, name", "products").build();
        assert_eq!(sql, "SELECT id, name FROM products WHERE 1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_predicates_bind_in_order() {
        let mut b = SqlBuilder::select("*", "orders");
        b.and_eq("currency", SqlValue::from("EUR"));
        b.and_in(
            "status",
            vec![SqlValue::from("PENDING"), SqlValue::from("PAID")],
        );
        b.and_gte("total_amount", SqlValue::from(10i64));
        let (sql, params) = b.build();
        assert_eq!(
            sql,
            "SELECT * FROM orders WHERE 1=1 AND currency = $1 \
             AND status IN ($2, $3) AND total_amount >= $4"
        );
        assert_dense(&sql, &params);
    }

    #[test]
    fn test_empty_in_set_emits_nothing() {
        let mut b = SqlBuilder::count("orders");
        b.and_in("status", vec![]);
        let (sql, params) = b.build();
        assert_eq!(sql, "SELECT COUNT(*) FROM orders WHERE 1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_search_binds_pattern_per_column() {
        let mut b = SqlBuilder::select("*", "customers");
        b.and_search(&["first_name", "last_name", "email"], "smith");
        let (sql, params) = b.build();
        assert_eq!(
            sql,
            "SELECT * FROM customers WHERE 1=1 AND \
             (first_name ILIKE $1 OR last_name ILIKE $2 OR email ILIKE $3)"
        );
        assert_eq!(params.len(), 3);
        assert!(params
            .iter()
            .all(|p| *p == SqlValue::Text("%smith%".to_string())));
    }

    #[test]
    fn test_search_value_never_appears_in_sql() {
        let mut b = SqlBuilder::select("*", "customers");
        b.and_search(&["email"], "alice'); DROP TABLE customers; --");
        b.and_eq("is_active", SqlValue::from(true));
        let (sql, params) = b.build();
        assert!(!sql.contains("DROP TABLE"));
        assert_dense(&sql, &params);
    }

    #[test]
    fn test_pagination_offset_wins_over_page() {
        // With limit=20, offset=40 and page=5 given together, the verbatim
        // offset is used and the page is ignored.
        let mut b = SqlBuilder::select("*", "orders");
        b.paginate(&Pagination {
            limit: 20,
            offset: 40,
            page: 5,
        });
        let (sql, params) = b.build();
        assert!(sql.ends_with(" LIMIT $1 OFFSET $2"));
        assert_eq!(params, vec![SqlValue::BigInt(20), SqlValue::BigInt(40)]);
    }

    #[test]
    fn test_pagination_page_derives_offset() {
        let mut b = SqlBuilder::select("*", "orders");
        b.paginate(&Pagination::pages(25, 3));
        let (_, params) = b.build();
        assert_eq!(params, vec![SqlValue::BigInt(25), SqlValue::BigInt(50)]);
    }

    #[test]
    fn test_pagination_zero_limit_emits_nothing() {
        let mut b = SqlBuilder::select("*", "orders");
        b.paginate(&Pagination {
            limit: 0,
            offset: 40,
            page: 5,
        });
        let (sql, params) = b.build();
        assert_eq!(sql, "SELECT * FROM orders WHERE 1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn test_page_one_has_no_offset() {
        let mut b = SqlBuilder::select("*", "orders");
        b.paginate(&Pagination::pages(10, 1));
        let (sql, params) = b.build();
        assert!(sql.ends_with(" LIMIT $1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_order_by_defaults() {
        let mut b = SqlBuilder::select("*", "orders");
        b.order_by(SortEntity::Orders, None, None).unwrap();
        let (sql, _) = b.build();
        assert!(sql.ends_with(" ORDER BY order_date DESC"));

        let mut b = SqlBuilder::select("*", "product_categories");
        b.order_by(SortEntity::Categories, None, None).unwrap();
        let (sql, _) = b.build();
        assert!(sql.ends_with(" ORDER BY sort_order ASC, name ASC"));
    }

    #[test]
    fn test_order_by_column_with_default_direction() {
        let mut b = SqlBuilder::select("*", "products");
        b.order_by(SortEntity::Products, Some("price"), None).unwrap();
        let (sql, _) = b.build();
        assert!(sql.ends_with(" ORDER BY price DESC"));
    }

    #[test]
    fn test_order_by_rejects_unlisted_column() {
        let mut b = SqlBuilder::select("*", "products");
        let err = b
            .order_by(SortEntity::Products, Some("name; DROP TABLE products"), None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSortColumn(_)));
    }

    #[test]
    fn test_order_by_rejects_bad_direction() {
        let mut b = SqlBuilder::select("*", "products");
        let err = b
            .order_by(SortEntity::Products, Some("name"), Some("UPWARD"))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidSortOrder(_)));
    }

    #[test]
    fn test_direction_without_column_uses_default_column() {
        let mut b = SqlBuilder::select("*", "orders");
        b.order_by(SortEntity::Orders, None, Some("asc")).unwrap();
        let (sql, _) = b.build();
        assert!(sql.ends_with(" ORDER BY order_date ASC"));
    }

    #[test]
    fn test_direction_only_keeps_category_tie_break() {
        // Flipping only the direction must not lose the name tie-break that
        // keeps same-rank siblings deterministic.
        let mut b = SqlBuilder::select("*", "product_categories");
        b.order_by(SortEntity::Categories, None, Some("desc")).unwrap();
        let (sql, _) = b.build();
        assert!(sql.ends_with(" ORDER BY sort_order DESC, name ASC"), "sql: {sql}");

        // An explicitly chosen column sorts by that column alone.
        let mut b = SqlBuilder::select("*", "product_categories");
        b.order_by(SortEntity::Categories, Some("sort_order"), Some("desc"))
            .unwrap();
        let (sql, _) = b.build();
        assert!(sql.ends_with(" ORDER BY sort_order DESC"), "sql: {sql}");
    }

    #[test]
    fn test_full_statement_shape() {
        let mut b = SqlBuilder::select("*", "orders");
        b.and_search(&["order_number"], "ORD");
        b.and_eq("currency", SqlValue::from("USD"));
        b.and_raw("customer_id IS NOT NULL");
        b.order_by(SortEntity::Orders, Some("total_amount"), Some("desc"))
            .unwrap();
        b.paginate(&Pagination::offset(10, 20));
        let (sql, params) = b.build();
        assert_eq!(
            sql,
            "SELECT * FROM orders WHERE 1=1 AND (order_number ILIKE $1) \
             AND currency = $2 AND customer_id IS NOT NULL \
             ORDER BY total_amount DESC LIMIT $3 OFFSET $4"
        );
        assert_dense(&sql, &params);
    }
}
