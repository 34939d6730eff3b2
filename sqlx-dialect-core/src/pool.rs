use std::fmt::Debug;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use futures_util::future;

use crate::error::{Error, Result};
use crate::value::Value;

/// A connection pool (or a transaction checked out of one) supplied by a driver.
///
/// This is the only surface through which the ORM runtime reaches the database.
/// Implementations are shared behind an `Arc`; whoever created the pool owns its lifecycle.
pub trait ConnPool: Debug + Send + Sync + 'static {
    /// Execute `sql` with `vars` bound to its placeholders, returning the number of rows affected.
    fn execute<'e>(&'e self, sql: &'e str, vars: &'e [Value]) -> BoxFuture<'e, Result<u64>>;

    /// Check that the database is reachable.
    fn ping(&self) -> BoxFuture<'_, Result<()>>;

    /// Begin a new transaction, returning a pool bound to it.
    fn begin(&self) -> BoxFuture<'_, Result<Arc<dyn ConnPool>>> {
        Box::pin(future::ready(Err(Error::Unsupported("transaction"))))
    }

    /// Commit the transaction this pool is bound to.
    fn commit(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(future::ready(Err(Error::InvalidTransaction)))
    }

    /// Roll back the transaction this pool is bound to.
    fn rollback(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(future::ready(Err(Error::InvalidTransaction)))
    }
}
