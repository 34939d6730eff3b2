use std::borrow::Cow;
use std::fmt::{self, Display, Formatter, Write};
use std::mem;

use crate::dialect::Dialect;
use crate::value::Value;

/// A SQL expression with its own bound variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub sql: Cow<'static, str>,
    pub vars: Vec<Value>,
}

impl Expr {
    /// An expression written into the statement verbatim.
    pub fn raw(sql: impl Into<Cow<'static, str>>) -> Self {
        Expr {
            sql: sql.into(),
            vars: Vec::new(),
        }
    }

    /// Writes the expression into `stmt`, binding its variables through `dialect`.
    ///
    /// Each `?` in the expression consumes the next variable.
    pub fn build(&self, dialect: &dyn Dialect, stmt: &mut Statement) -> fmt::Result {
        let mut vars = self.vars.iter();
        let mut rest = &*self.sql;

        while let Some(pos) = rest.find('?') {
            let Some(var) = vars.next() else {
                break;
            };

            stmt.write_str(&rest[..pos])?;
            stmt.add_var(dialect, var.clone())?;
            rest = &rest[pos + 1..];
        }

        stmt.write_str(rest)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A statement being built by the ORM runtime: the SQL text written so far and the
/// variables accumulated for its placeholders, in order.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    sql: String,
    vars: Vec<Value>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The variables accumulated so far.
    pub fn vars(&self) -> &[Value] {
        &self.vars
    }

    /// Accumulates `value` and writes its placeholder.
    ///
    /// The variable is pushed *before* the dialect renders the placeholder, so a
    /// positional dialect sees its own ordinal as the number of accumulated variables.
    pub fn add_var(&mut self, dialect: &dyn Dialect, value: impl Into<Value>) -> fmt::Result {
        let value = value.into();
        self.vars.push(value);

        let mut sql = mem::take(&mut self.sql);
        let res = match self.vars.last() {
            Some(value) => dialect.bind_var_to(&mut sql, self, value),
            None => Ok(()),
        };
        self.sql = sql;

        res
    }

    /// Writes `ident` quoted by `dialect`.
    pub fn write_quoted(&mut self, dialect: &dyn Dialect, ident: &str) -> fmt::Result {
        dialect.quote_to(&mut self.sql, ident)
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.vars)
    }
}

impl Write for Statement {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.sql.push_str(s);
        Ok(())
    }
}
