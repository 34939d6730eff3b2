//! Core of sqlx-dialect: the contract an ORM runtime consumes to speak one database's
//! SQL grammar, and the handful of runtime pieces a dialect needs to plug into.
//!
//! Not intended to be used directly; see the `sqlx-dialect` crate.
#![warn(future_incompatible, rust_2018_idioms)]
#![forbid(unsafe_code)]

#[macro_use]
pub mod logger;

pub mod callbacks;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod migrate;
pub mod pool;
pub mod schema;
pub mod statement;
pub mod value;

pub use callbacks::{Callbacks, CallbacksConfig, Operation};
pub use db::{Db, DbConfig};
pub use dialect::{Dialect, SavePointer};
pub use driver::{Driver, DriverOptions};
pub use error::{BoxDynError, Error, Result};
pub use migrate::{Index, Migrator, MigratorConfig, Table};
pub use pool::ConnPool;
pub use schema::{DataType, Field};
pub use statement::{Expr, Statement};
pub use value::Value;

// re-exported for drivers and dialects
pub use futures_core::future::BoxFuture;
pub use regex::Regex;
