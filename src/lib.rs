//! # Stockyard
//!
//! Coroutine-native PostgreSQL persistence layer for an ERP backend,
//! built on the `may` runtime and `may_postgres`.
//!
//! The crate is organised around three layers:
//! - [`sql`]: an injection-safe dynamic statement builder with
//!   whitelist-validated sort identifiers and dense `$n` placeholders.
//! - [`executor`] and [`transaction`]: a narrow execution seam over a
//!   `may_postgres` client, with scoped BEGIN/COMMIT/ROLLBACK handles.
//! - [`repo`]: the repositories themselves — catalog tree, products,
//!   orders, inventory concurrency engine, customers, verification
//!   tokens and role lookup.

pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod executor;
pub mod filter;
pub mod repo;
pub mod sql;
pub mod transaction;

pub use connection::connect;
pub use error::StoreError;
pub use executor::{ClientExecutor, DbExecutor};
pub use transaction::Transaction;
