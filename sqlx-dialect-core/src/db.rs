use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::callbacks::{Callbacks, CallbacksConfig};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::logger::{LogSettings, QueryLogger};
use crate::migrate::Migrator;
use crate::pool::ConnPool;
use crate::value::Value;

/// Configuration of a [`Db`] handle that does not depend on the dialect.
#[derive(Debug, Clone, Default)]
pub struct DbConfig {
    pub log_settings: LogSettings,
}

/// A handle to a database: a dialect, the pool it opened, and the statement callbacks
/// it installed.
///
/// Cloning is cheap. A handle returned by [`Db::begin`] is bound to that transaction.
#[derive(Clone)]
pub struct Db {
    dialect: Arc<dyn Dialect>,
    conn_pool: Option<Arc<dyn ConnPool>>,
    callbacks: Callbacks,
    config: Arc<DbConfig>,
}

impl Db {
    /// Open a handle with `dialect`, letting it initialize callbacks and the connection pool.
    pub fn open(dialect: impl Dialect) -> Result<Self> {
        Self::open_with(dialect, DbConfig::default())
    }

    pub fn open_with(dialect: impl Dialect, config: DbConfig) -> Result<Self> {
        let dialect: Arc<dyn Dialect> = Arc::new(dialect);

        let mut db = Db {
            dialect: Arc::clone(&dialect),
            conn_pool: None,
            callbacks: Callbacks::default(),
            config: Arc::new(config),
        };

        dialect.initialize(&mut db)?;

        tracing::debug!(dialect = dialect.name(), "initialized dialect");

        Ok(db)
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Replace the statement callbacks with the runtime defaults shaped by `config`.
    pub fn register_default_callbacks(&mut self, config: &CallbacksConfig) {
        self.callbacks = Callbacks::with_config(config);
    }

    pub fn set_conn_pool(&mut self, pool: Arc<dyn ConnPool>) {
        self.conn_pool = Some(pool);
    }

    pub fn conn_pool(&self) -> Result<&Arc<dyn ConnPool>> {
        self.conn_pool.as_ref().ok_or(Error::NoConnPool)
    }

    pub fn migrator(&self) -> Migrator<'_> {
        self.dialect.migrator(self)
    }

    /// Execute a statement, returning the number of rows affected.
    pub async fn exec(&self, sql: &str, vars: &[Value]) -> Result<u64> {
        let pool = self.conn_pool()?;
        let mut logger = QueryLogger::new(sql, vars, &*self.dialect, &self.config.log_settings);

        match pool.execute(sql, vars).await {
            Ok(rows_affected) => {
                logger.increase_rows_affected(rows_affected);
                Ok(rows_affected)
            }

            Err(e) => {
                logger.fail();
                Err(e)
            }
        }
    }

    pub async fn ping(&self) -> Result<()> {
        self.conn_pool()?.ping().await
    }

    /// Begin a transaction, returning a handle bound to it.
    pub async fn begin(&self) -> Result<Db> {
        let tx = self.conn_pool()?.begin().await?;

        Ok(Db {
            conn_pool: Some(tx),
            ..self.clone()
        })
    }

    pub async fn commit(&self) -> Result<()> {
        self.conn_pool()?.commit().await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.conn_pool()?.rollback().await
    }

    /// Establish savepoint `name` through the dialect.
    pub async fn save_point(&self, name: &str) -> Result<()> {
        self.dialect
            .save_pointer()
            .ok_or(Error::Unsupported("savepoint"))?
            .save_point(self, name)
            .await
    }

    /// Roll back to savepoint `name` through the dialect.
    pub async fn rollback_to(&self, name: &str) -> Result<()> {
        self.dialect
            .save_pointer()
            .ok_or(Error::Unsupported("savepoint"))?
            .rollback_to(self, name)
            .await
    }
}

impl Debug for Db {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("dialect", &self.dialect.name())
            .field("conn_pool", &self.conn_pool)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
