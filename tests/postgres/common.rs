#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex};

use futures_util::future;
use sqlx_dialect::postgres::{PgConfig, PgDialect};
use sqlx_dialect::{BoxFuture, ConnPool, Db, Error, Result, Value};

pub fn setup_if_needed() {
    let _ = dotenvy::dotenv();
    let _ = env_logger::builder().is_test(true).try_init();
}

// Open a handle against `DATABASE_URL`, or `None` when no database is configured
pub fn connect() -> anyhow::Result<Option<Db>> {
    setup_if_needed();

    if env::var_os("DATABASE_URL").is_none() {
        eprintln!("DATABASE_URL is not set; skipping database-backed test");
        return Ok(None);
    }

    sqlx_dialect::install_default_drivers();

    Ok(Some(Db::open(PgDialect::new(PgConfig::from_env()?))?))
}

/// A pool that records every statement instead of running it.
#[derive(Debug, Default)]
pub struct RecordingPool {
    pub executed: Mutex<Vec<(String, Vec<Value>)>>,
    pub fail: bool,
}

impl RecordingPool {
    pub fn failing() -> Self {
        RecordingPool {
            fail: true,
            ..Self::default()
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }
}

impl ConnPool for RecordingPool {
    fn execute<'e>(&'e self, sql: &'e str, vars: &'e [Value]) -> BoxFuture<'e, Result<u64>> {
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_owned(), vars.to_vec()));

        if self.fail {
            return Box::pin(future::ready(Err(Error::Database(
                format!("syntax error at or near {sql:?}").into(),
            ))));
        }

        Box::pin(future::ready(Ok(0)))
    }

    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(future::ready(Ok(())))
    }
}

pub fn open_with_pool(pool: &Arc<RecordingPool>) -> Db {
    let conn: Arc<dyn ConnPool> = pool.clone();

    Db::open(PgDialect::new(PgConfig::new().conn(conn))).unwrap()
}
