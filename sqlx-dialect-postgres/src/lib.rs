//! **PostgreSQL** dialect and driver implementation for sqlx-dialect.
#![warn(future_incompatible, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod config;
mod dialect;
mod driver;
mod dsn;
mod pool;

pub use config::PgConfig;
pub use dialect::{PgDialect, DIALECT_NAME};
pub use driver::DRIVER;
pub use dsn::{parse_dsn, PgDsnParams, DEFAULT_PORT};
pub use pool::{PgConnPool, PgTxConnPool};
