use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx_dialect_core::driver::{Driver, DriverOptions};
use sqlx_dialect_core::error::{Error, Result};
use sqlx_dialect_core::pool::ConnPool;

use crate::dialect::DIALECT_NAME;
use crate::pool::PgConnPool;

/// The default PostgreSQL driver, backed by sqlx.
///
/// Pass it to [`install_drivers`][sqlx_dialect_core::driver::install_drivers].
pub const DRIVER: Driver = Driver::new(DIALECT_NAME, open);

/// Open a lazily connecting pool: the connection string is validated here, but no
/// connection is made until the first statement or ping.
///
/// The pool runs its maintenance on the current Tokio runtime, so opening outside of one
/// fails with [`Error::DriverOpen`].
fn open(dsn: &str, options: &DriverOptions) -> Result<Arc<dyn ConnPool>> {
    tokio::runtime::Handle::try_current().map_err(|e| Error::driver_open(DIALECT_NAME, e))?;

    let mut connect_options =
        PgConnectOptions::from_str(dsn).map_err(|e| Error::driver_open(DIALECT_NAME, e))?;

    if options.prefer_simple_protocol {
        connect_options = connect_options.statement_cache_capacity(0);
    }

    let pool = PgPoolOptions::new().connect_lazy_with(connect_options);

    Ok(Arc::new(
        PgConnPool::new(pool).persistent(!options.prefer_simple_protocol),
    ))
}
