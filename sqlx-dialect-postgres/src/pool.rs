use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use futures_core::future::BoxFuture;
use futures_util::lock::Mutex;
use sqlx::postgres::{PgArguments, PgPool};
use sqlx::query::Query;
use sqlx::{Connection, Postgres, Transaction};
use sqlx_dialect_core::error::{Error, Result};
use sqlx_dialect_core::pool::ConnPool;
use sqlx_dialect_core::value::Value;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A [`ConnPool`] backed by a sqlx [`PgPool`].
#[derive(Debug, Clone)]
pub struct PgConnPool {
    pool: PgPool,
    persistent: bool,
}

impl PgConnPool {
    pub fn new(pool: PgPool) -> Self {
        PgConnPool {
            pool,
            persistent: true,
        }
    }

    /// Whether statements are prepared and cached on the connection. Turned off when
    /// the simple protocol is preferred.
    pub fn persistent(mut self, value: bool) -> Self {
        self.persistent = value;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<PgPool> for PgConnPool {
    fn from(pool: PgPool) -> Self {
        Self::new(pool)
    }
}

impl ConnPool for PgConnPool {
    fn execute<'e>(&'e self, sql: &'e str, vars: &'e [Value]) -> BoxFuture<'e, Result<u64>> {
        Box::pin(async move {
            let query = bind_all(sqlx::query(sql).persistent(self.persistent), vars)?;
            let done = query.execute(&self.pool).await.map_err(Error::database)?;

            Ok(done.rows_affected())
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await.map_err(Error::database)?;

            conn.ping().await.map_err(Error::database)
        })
    }

    fn begin(&self) -> BoxFuture<'_, Result<Arc<dyn ConnPool>>> {
        Box::pin(async move {
            let tx = self.pool.begin().await.map_err(Error::database)?;

            let tx: Arc<dyn ConnPool> = Arc::new(PgTxConnPool {
                tx: Mutex::new(Some(tx)),
                persistent: self.persistent,
            });

            Ok(tx)
        })
    }
}

/// A [`ConnPool`] bound to one open transaction.
///
/// Statements run on the transaction's connection until it is committed or rolled back;
/// afterwards every call fails with [`Error::InvalidTransaction`]. Dropping it while the
/// transaction is still open rolls the transaction back.
pub struct PgTxConnPool {
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
    persistent: bool,
}

impl ConnPool for PgTxConnPool {
    fn execute<'e>(&'e self, sql: &'e str, vars: &'e [Value]) -> BoxFuture<'e, Result<u64>> {
        Box::pin(async move {
            let mut guard = self.tx.lock().await;
            let tx = guard.as_mut().ok_or(Error::InvalidTransaction)?;

            let query = bind_all(sqlx::query(sql).persistent(self.persistent), vars)?;
            let done = query.execute(&mut **tx).await.map_err(Error::database)?;

            Ok(done.rows_affected())
        })
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut guard = self.tx.lock().await;
            let tx = guard.as_mut().ok_or(Error::InvalidTransaction)?;

            tx.ping().await.map_err(Error::database)
        })
    }

    fn commit(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let tx = self.tx.lock().await.take().ok_or(Error::InvalidTransaction)?;

            tx.commit().await.map_err(Error::database)
        })
    }

    fn rollback(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let tx = self.tx.lock().await.take().ok_or(Error::InvalidTransaction)?;

            tx.rollback().await.map_err(Error::database)
        })
    }
}

impl Debug for PgTxConnPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgTxConnPool")
            .field("persistent", &self.persistent)
            .finish_non_exhaustive()
    }
}

fn bind_all<'q>(mut query: PgQuery<'q>, vars: &'q [Value]) -> Result<PgQuery<'q>> {
    for value in vars {
        query = bind(query, value)?;
    }

    Ok(query)
}

fn bind<'q>(query: PgQuery<'q>, value: &'q Value) -> Result<PgQuery<'q>> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Uint(v) => query.bind(i64::try_from(*v).map_err(|e| Error::Encode(e.into()))?),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Time(v) => query.bind(*v),
        other => return Err(Error::Encode(format!("unsupported value: {other:?}").into())),
    })
}
