//! Scoped database transactions.
//!
//! A [`Transaction`] is begun, used, and either committed or rolled back
//! within a single repository operation; the handle is never returned to a
//! caller outside the layer. Dropping a live handle rolls the transaction
//! back, so an early `?` return cannot leave partial state behind.

use crate::error::StoreError;
use crate::executor::DbExecutor;
use may_postgres::types::ToSql;
use may_postgres::{Client, Row};

/// A database transaction.
///
/// All statements executed through the handle commit or roll back together.
pub struct Transaction {
    client: Client,
    closed: bool,
}

impl Transaction {
    /// Begin a transaction on the given connection.
    pub(crate) fn begin(client: Client) -> Result<Self, StoreError> {
        client.execute("BEGIN", &[]).map_err(StoreError::from)?;
        Ok(Self {
            client,
            closed: false,
        })
    }

    /// Commit the transaction. The handle is consumed.
    pub fn commit(mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Transaction(
                "transaction already closed".to_string(),
            ));
        }
        self.client.execute("COMMIT", &[]).map_err(StoreError::from)?;
        self.closed = true;
        Ok(())
    }

    /// Roll the transaction back. The handle is consumed.
    pub fn rollback(mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Transaction(
                "transaction already closed".to_string(),
            ));
        }
        self.client
            .execute("ROLLBACK", &[])
            .map_err(StoreError::from)?;
        self.closed = true;
        Ok(())
    }

    fn guard(&self) -> Result<(), StoreError> {
        if self.closed {
            Err(StoreError::Transaction(
                "transaction already closed".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl DbExecutor for Transaction {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        self.guard()?;
        self.client.execute(query, params).map_err(StoreError::from)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        self.guard()?;
        self.client
            .query_one(query, params)
            .map_err(StoreError::from)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        self.guard()?;
        self.client.query(query, params).map_err(StoreError::from)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.closed {
            // Best effort; an error here means the connection is gone and
            // the server will roll back on its own.
            if let Err(e) = self.client.execute("ROLLBACK", &[]) {
                log::warn!("rollback on drop failed: {e}");
            }
            self.closed = true;
        }
    }
}
