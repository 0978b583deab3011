//! Error taxonomy for the persistence layer.
//!
//! Every repository operation surfaces one of these kinds. The layer does
//! not translate one kind into another and does not retry, with the single
//! exception of the order-number minter's bounded loop.

use may_postgres::Error as PostgresError;
use std::fmt;

/// Store error type
#[derive(Debug)]
pub enum StoreError {
    /// A point read (by id, code, sku, path, ...) matched zero rows.
    NotFound {
        /// Entity name, e.g. `"order"` or `"inventory"`.
        entity: &'static str,
    },
    /// A user-supplied sort column was not in the entity's allow-list.
    InvalidSortColumn(String),
    /// A user-supplied sort direction was neither ASC nor DESC.
    InvalidSortOrder(String),
    /// Malformed input: unparsable identifier, unknown grouping token,
    /// a reparent that would create a cycle, and the like.
    InvalidArgument(String),
    /// Reserve precondition not met: `available < requested`.
    InsufficientStock,
    /// Release precondition not met: `reserved < requested`.
    InsufficientReserved,
    /// Approval precondition not met: the transaction does not exist or was
    /// already approved by another caller.
    NotFoundOrAlreadyApproved,
    /// The order-number minter ran out of retry attempts.
    OrderNumberExhausted,
    /// `PostgreSQL` error from `may_postgres`, wrapped with no translation.
    Postgres(PostgresError),
    /// Transaction lifecycle error (begin/commit/rollback on a closed handle).
    Transaction(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { entity } => {
                write!(f, "{entity} not found")
            }
            StoreError::InvalidSortColumn(col) => {
                write!(f, "invalid sort column: {col}")
            }
            StoreError::InvalidSortOrder(ord) => {
                write!(f, "invalid sort order: {ord}")
            }
            StoreError::InvalidArgument(msg) => {
                write!(f, "invalid argument: {msg}")
            }
            StoreError::InsufficientStock => {
                write!(f, "insufficient available stock to reserve")
            }
            StoreError::InsufficientReserved => {
                write!(f, "insufficient reserved stock to release")
            }
            StoreError::NotFoundOrAlreadyApproved => {
                write!(f, "transaction not found or already approved")
            }
            StoreError::OrderNumberExhausted => {
                write!(f, "could not generate a unique order number")
            }
            StoreError::Postgres(e) => {
                write!(f, "PostgreSQL error: {e}")
            }
            StoreError::Transaction(s) => {
                write!(f, "transaction error: {s}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        StoreError::Postgres(err)
    }
}

impl StoreError {
    /// Shorthand used by point reads when `query_opt` came back empty.
    pub fn not_found(entity: &'static str) -> Self {
        StoreError::NotFound { entity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = StoreError::not_found("order");
        assert_eq!(err.to_string(), "order not found");
    }

    #[test]
    fn test_display_sort_errors() {
        let err = StoreError::InvalidSortColumn("name; DROP TABLE products".to_string());
        assert!(err.to_string().contains("invalid sort column"));

        let err = StoreError::InvalidSortOrder("SIDEWAYS".to_string());
        assert!(err.to_string().contains("invalid sort order"));
    }

    #[test]
    fn test_display_stock_errors() {
        assert!(StoreError::InsufficientStock.to_string().contains("reserve"));
        assert!(StoreError::InsufficientReserved
            .to_string()
            .contains("release"));
    }

    #[test]
    fn test_display_approval_and_minter() {
        assert!(StoreError::NotFoundOrAlreadyApproved
            .to_string()
            .contains("already approved"));
        assert!(StoreError::OrderNumberExhausted
            .to_string()
            .contains("order number"));
    }
}
