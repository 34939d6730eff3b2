use std::fmt::{self, Debug, Write};

use futures_core::future::BoxFuture;

use crate::db::Db;
use crate::error::Result;
use crate::migrate::Migrator;
use crate::schema::Field;
use crate::statement::{Expr, Statement};
use crate::value::Value;

/// The contract between the ORM runtime and a database-specific SQL grammar.
///
/// A dialect holds its configuration and nothing else; every rendering method is pure
/// and may be called concurrently for independent statements.
pub trait Dialect: Debug + Send + Sync + 'static {
    /// The name the runtime uses to select dialect-specific behavior.
    fn name(&self) -> &'static str;

    /// Install callbacks and a connection pool on a freshly opened [`Db`].
    fn initialize(&self, db: &mut Db) -> Result<()>;

    /// A schema migration helper bound to this dialect.
    fn migrator<'a>(&'a self, db: &'a Db) -> Migrator<'a>;

    /// The SQL type name of a column.
    fn data_type_of(&self, field: &Field) -> String;

    /// The expression inserted for a field that was given no value.
    fn default_value_of(&self, field: &Field) -> Expr;

    /// Write the placeholder for `value`, which is already the last of `stmt.vars()`.
    fn bind_var_to(&self, writer: &mut dyn Write, stmt: &Statement, value: &Value) -> fmt::Result;

    /// Write `ident` as a quoted identifier.
    fn quote_to(&self, writer: &mut dyn Write, ident: &str) -> fmt::Result;

    /// Render `sql` with `vars` substituted, for logging only.
    fn explain(&self, sql: &str, vars: &[Value]) -> String;

    fn quote(&self, ident: &str) -> String {
        let mut quoted = String::with_capacity(ident.len() + 2);
        // writing into a `String` cannot fail
        let _ = self.quote_to(&mut quoted, ident);
        quoted
    }

    /// Savepoint support, if the database has it.
    fn save_pointer(&self) -> Option<&dyn SavePointer> {
        None
    }
}

/// Named savepoints within an open transaction.
pub trait SavePointer: Send + Sync {
    /// Establish savepoint `name` in the transaction `tx` is bound to.
    fn save_point<'a>(&'a self, tx: &'a Db, name: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Restore the transaction `tx` is bound to as of savepoint `name`.
    fn rollback_to<'a>(&'a self, tx: &'a Db, name: &'a str) -> BoxFuture<'a, Result<()>>;
}
