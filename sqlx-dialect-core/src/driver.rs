//! Explicit registration of the drivers a [`Dialect`][crate::Dialect] may open pools with.
//!
//! Nothing is registered as a side effect of linking a driver crate; the application
//! calls [`install_drivers`] once at startup (the facade crate's
//! `install_default_drivers()` does this idempotently for the compiled-in drivers).

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{BoxDynError, Error, Result};
use crate::pool::ConnPool;

static DRIVERS: OnceCell<&'static [Driver]> = OnceCell::new();

/// Options forwarded by a dialect to the driver it opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    pub prefer_simple_protocol: bool,
}

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avoid implicitly prepared statements where the driver allows it.
    pub fn prefer_simple_protocol(mut self, prefer: bool) -> Self {
        self.prefer_simple_protocol = prefer;
        self
    }
}

/// A named constructor for [`ConnPool`]s.
#[derive(Debug)]
pub struct Driver {
    name: &'static str,
    open: fn(&str, &DriverOptions) -> Result<Arc<dyn ConnPool>>,
}

impl Driver {
    pub const fn new(
        name: &'static str,
        open: fn(&str, &DriverOptions) -> Result<Arc<dyn ConnPool>>,
    ) -> Self {
        Driver { name, open }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Install the list of drivers that [`open`] may select by name.
///
/// ### Errors
/// If called more than once.
pub fn install_drivers(drivers: &'static [Driver]) -> Result<(), BoxDynError> {
    DRIVERS
        .set(drivers)
        .map_err(|_| -> BoxDynError { "drivers already installed".into() })?;

    tracing::debug!(
        drivers = ?drivers.iter().map(Driver::name).collect::<Vec<_>>(),
        "installed drivers"
    );

    Ok(())
}

/// Returns `true` once [`install_drivers`] has succeeded.
pub fn drivers_installed() -> bool {
    DRIVERS.get().is_some()
}

/// Open a connection pool for `dsn` with the installed driver called `name`.
///
/// The driver is handed the DSN untouched; opening is attempted exactly once.
pub fn open(name: &str, dsn: &str, options: &DriverOptions) -> Result<Arc<dyn ConnPool>> {
    let drivers = DRIVERS.get().ok_or(Error::DriversNotInstalled)?;

    let driver = drivers
        .iter()
        .find(|driver| driver.name == name)
        .ok_or_else(|| Error::DriverNotFound(name.to_owned()))?;

    tracing::debug!(driver = driver.name, ?options, "opening connection pool");

    (driver.open)(dsn, options).map_err(|e| match e {
        e @ Error::DriverOpen { .. } => e,
        e => Error::driver_open(name, e),
    })
}
