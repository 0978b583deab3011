//! Domain records the persistence layer reads and writes.
//!
//! Only the facets the core operations touch are modelled; the wire shapes
//! of the wider application live elsewhere.

mod category;
mod customer;
mod inventory;
mod order;
mod product;
pub mod stats;
mod token;

pub use category::{Category, CategorySeo, NewCategory};
pub use customer::{Company, Customer};
pub use inventory::{
    InventoryRow, InventoryTransaction, NewInventoryTransaction, TransactionType,
};
pub use order::{Order, OrderStatus, PaymentStatus};
pub use product::Product;
pub use token::{EmailVerification, NewEmailVerification};

use crate::error::StoreError;
use may_postgres::Row;

/// Conversion from a database row to a typed record.
///
/// Implementations read columns by name with `try_get` so the projection
/// constant and the struct can evolve together.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, StoreError>;
}

/// Map a row set through `FromRow`.
pub fn rows_to_vec<T: FromRow>(rows: &[Row]) -> Result<Vec<T>, StoreError> {
    rows.iter().map(T::from_row).collect()
}
