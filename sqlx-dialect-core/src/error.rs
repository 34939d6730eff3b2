//! Types for working with errors produced by dialects, drivers and the ORM handle.

use std::error::Error as StdError;
use std::fmt::Display;
use std::result::Result as StdResult;

/// A specialized `Result` type for sqlx-dialect.
pub type Result<T, E = Error> = StdResult<T, E>;

// Convenience type alias for usage within sqlx-dialect.
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// Represents all the ways a method can fail within sqlx-dialect.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error occurred while parsing a connection string.
    #[error("error occurred while parsing a connection string: {0}")]
    MalformedConnectionString(#[source] BoxDynError),

    /// The driver rejected the connection string or could not reach the server.
    #[error("driver {driver:?} failed to open a connection pool: {source}")]
    DriverOpen {
        driver: String,

        #[source]
        source: BoxDynError,
    },

    /// [`install_drivers`][crate::driver::install_drivers] was never called.
    #[error("no drivers installed; call `install_drivers()` (or `install_default_drivers()`) at startup")]
    DriversNotInstalled,

    /// No installed driver answers to the requested name.
    #[error("unknown driver {0:?}; was it passed to `install_drivers()`?")]
    DriverNotFound(String),

    /// Invalid or missing configuration.
    #[error("error with configuration: {0}")]
    Configuration(#[source] BoxDynError),

    /// Error returned from the database while executing a statement.
    #[error("error returned from database: {0}")]
    Database(#[source] BoxDynError),

    /// A bound value could not be encoded for the driver.
    #[error("error occurred while encoding a value: {0}")]
    Encode(#[source] BoxDynError),

    /// The handle has no connection pool; the dialect was never initialized.
    #[error("no connection pool; the dialect has not been initialized")]
    NoConnPool,

    /// A transaction operation was attempted outside of a transaction.
    #[error("invalid transaction: not inside a transaction")]
    InvalidTransaction,

    /// The dialect does not implement the requested capability.
    #[error("the {0} capability is not supported by this dialect")]
    Unsupported(&'static str),
}

impl Error {
    #[inline]
    pub fn config(err: impl StdError + Send + Sync + 'static) -> Self {
        Error::Configuration(err.into())
    }

    #[inline]
    pub fn malformed(err: impl Into<BoxDynError>) -> Self {
        Error::MalformedConnectionString(err.into())
    }

    #[inline]
    pub fn database(err: impl StdError + Send + Sync + 'static) -> Self {
        Error::Database(err.into())
    }

    pub fn driver_open(driver: impl Display, err: impl Into<BoxDynError>) -> Self {
        Error::DriverOpen {
            driver: driver.to_string(),
            source: err.into(),
        }
    }
}
