//! Declarative filter records for listable entities.
//!
//! A filter enumerates which predicates the query builder may emit for an
//! entity, plus pagination and sort. Filters are plain data: they derive
//! `Deserialize` so hosts can lift them off a request payload, and nothing
//! here touches the database.

mod category;
mod customer;
mod inventory;
mod order;
mod product;

pub use category::CategoryFilter;
pub use customer::{CompanyFilter, CustomerFilter};
pub use inventory::{InventoryFilter, InventoryTransactionFilter};
pub use order::OrderFilter;
pub use product::ProductFilter;

use serde::Deserialize;

/// Pagination knobs shared by every filter.
///
/// `limit == 0` means "no LIMIT". When both `offset` and `page` are set,
/// `offset` wins; otherwise `page > 1` derives an offset of
/// `(page - 1) * limit`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub page: i64,
}

impl Pagination {
    /// Page-sized pagination starting at page 1.
    pub fn pages(limit: i64, page: i64) -> Self {
        Pagination {
            limit,
            offset: 0,
            page,
        }
    }

    /// Offset-based pagination.
    pub fn offset(limit: i64, offset: i64) -> Self {
        Pagination {
            limit,
            offset,
            page: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_deserializes_with_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p, Pagination::default());

        let p: Pagination = serde_json::from_str(r#"{"limit": 20, "page": 3}"#).unwrap();
        assert_eq!(p.limit, 20);
        assert_eq!(p.page, 3);
        assert_eq!(p.offset, 0);
    }
}
