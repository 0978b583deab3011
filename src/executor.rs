//! Database execution abstraction over `may_postgres`.
//!
//! Repositories never hold a connection; they borrow an executor for the
//! duration of one operation. The same trait is implemented by the direct
//! client wrapper and by [`crate::transaction::Transaction`], so every
//! repository method works unchanged inside or outside a transaction.

use crate::error::StoreError;
use may_postgres::types::ToSql;
use may_postgres::{Client, Row};

/// Trait for executing database operations.
///
/// Each call is one database round-trip and suspends the calling coroutine
/// at I/O. Implementations: [`ClientExecutor`] (autocommit) and
/// [`crate::transaction::Transaction`] (scoped transaction).
pub trait DbExecutor {
    /// Execute a statement and return the number of rows affected.
    ///
    /// The affected-row count is load-bearing here: the inventory engine
    /// and the approval workflow encode their preconditions in `WHERE`
    /// clauses and read failure off a zero count.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError>;

    /// Execute a query expected to return exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError>;

    /// Execute a query and return all rows.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError>;

    /// Execute a query returning zero or one row.
    ///
    /// Point reads use this to tell "not found" apart from an execution
    /// error; list paths use `query_all` and an empty vector is not an
    /// error.
    fn query_opt(&self, query: &str, params: &[&dyn ToSql]) -> Result<Option<Row>, StoreError> {
        Ok(self.query_all(query, params)?.into_iter().next())
    }
}

/// Autocommit executor over a `may_postgres::Client`.
pub struct ClientExecutor {
    client: Client,
}

impl ClientExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Start a scoped transaction on this connection.
    ///
    /// The handle must be committed or rolled back within the calling
    /// operation; dropping it live rolls back.
    pub fn begin(&self) -> Result<crate::transaction::Transaction, StoreError> {
        crate::transaction::Transaction::begin(self.client.clone())
    }
}

impl DbExecutor for ClientExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        self.client.execute(query, params).map_err(StoreError::from)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        self.client
            .query_one(query, params)
            .map_err(StoreError::from)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        self.client.query(query, params).map_err(StoreError::from)
    }
}
