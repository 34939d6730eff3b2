use std::borrow::Cow;
use std::fmt::{self, Write};
use std::sync::Arc;

use futures_core::future::BoxFuture;
use once_cell::sync::Lazy;
use sqlx_dialect_core::callbacks::CallbacksConfig;
use sqlx_dialect_core::db::Db;
use sqlx_dialect_core::dialect::{Dialect, SavePointer};
use sqlx_dialect_core::driver::{self, DriverOptions};
use sqlx_dialect_core::error::Result;
use sqlx_dialect_core::logger::explain_sql;
use sqlx_dialect_core::migrate::{Migrator, MigratorConfig};
use sqlx_dialect_core::schema::{DataType, Field};
use sqlx_dialect_core::statement::{Expr, Statement};
use sqlx_dialect_core::value::Value;
use sqlx_dialect_core::Regex;

use crate::config::PgConfig;
use crate::dsn::PgDsnParams;

/// The name this dialect answers to, and the driver it opens by default.
pub const DIALECT_NAME: &str = "postgres";

static NUMERIC_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)").expect("BUG: invalid placeholder pattern"));

/// The PostgreSQL dialect.
#[derive(Debug, Clone)]
pub struct PgDialect {
    config: PgConfig,
}

impl PgDialect {
    /// A dialect connecting to `dsn` with the default driver.
    ///
    /// The connection string is parsed up front so that a malformed one is reported here
    /// rather than when the pool is opened.
    pub fn open(dsn: &str) -> Result<Self> {
        let params = PgDsnParams::parse(dsn)?;

        tracing::debug!(?params, "parsed connection string");

        Ok(PgDialect {
            config: PgConfig::new().dsn(dsn).with_params(params),
        })
    }

    pub fn new(config: PgConfig) -> Self {
        PgDialect { config }
    }

    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// The connection string handed to the driver.
    ///
    /// URL-form strings are passed through untouched; keyword/value strings are
    /// rendered as a URL first, since that is the only form the driver reads.
    fn driver_dsn(&self) -> Result<Cow<'_, str>> {
        let dsn = &self.config.dsn;

        if dsn.contains("://") {
            return Ok(Cow::Borrowed(dsn));
        }

        let url = match &self.config.params {
            Some(params) => params.to_url()?,
            None => PgDsnParams::parse(dsn)?.to_url()?,
        };

        Ok(Cow::Owned(url.into()))
    }
}

impl Dialect for PgDialect {
    fn name(&self) -> &'static str {
        DIALECT_NAME
    }

    fn initialize(&self, db: &mut Db) -> Result<()> {
        db.register_default_callbacks(&CallbacksConfig::with_returning(
            !self.config.without_returning,
        ));

        let pool = match (&self.config.conn, &self.config.driver_name) {
            (Some(conn), _) => Arc::clone(conn),

            (None, driver_name) => {
                let options =
                    DriverOptions::new().prefer_simple_protocol(self.config.prefer_simple_protocol);

                driver::open(
                    driver_name.as_deref().unwrap_or(DIALECT_NAME),
                    &self.driver_dsn()?,
                    &options,
                )?
            }
        };

        db.set_conn_pool(pool);

        Ok(())
    }

    fn migrator<'a>(&'a self, db: &'a Db) -> Migrator<'a> {
        // some index types cannot be declared inline with the table in PostgreSQL
        Migrator::new(MigratorConfig {
            db,
            dialect: self,
            create_index_after_create_table: true,
        })
    }

    fn data_type_of(&self, field: &Field) -> String {
        match &field.data_type {
            DataType::Bool => "boolean".into(),

            data_type @ (DataType::Int | DataType::Uint) => {
                let size = if *data_type == DataType::Uint {
                    // unsigned values need one more bit
                    field.size.saturating_add(1)
                } else {
                    field.size
                };

                let name = match (field.auto_increment, size) {
                    (true, 0..=16) => "smallserial",
                    (true, 17..=32) => "serial",
                    (true, _) => "bigserial",
                    (false, 0..=16) => "smallint",
                    (false, 17..=32) => "integer",
                    (false, _) => "bigint",
                };

                name.into()
            }

            DataType::Float => match (field.precision, field.scale) {
                (0, _) => "decimal".into(),
                (precision, 0) => format!("numeric({precision})"),
                (precision, scale) => format!("numeric({precision}, {scale})"),
            },

            DataType::String if field.size > 0 => format!("varchar({})", field.size),
            DataType::String => "text".into(),

            DataType::Time if field.precision > 0 => format!("timestamptz({})", field.precision),
            DataType::Time => "timestamptz".into(),

            DataType::Bytes => "bytea".into(),

            other => other.as_str().to_owned(),
        }
    }

    fn default_value_of(&self, _field: &Field) -> Expr {
        Expr::raw("DEFAULT")
    }

    fn bind_var_to(&self, writer: &mut dyn Write, stmt: &Statement, _value: &Value) -> fmt::Result {
        write!(writer, "${}", stmt.vars().len())
    }

    fn quote_to(&self, writer: &mut dyn Write, ident: &str) -> fmt::Result {
        // embedded quotes are not escaped
        for (idx, segment) in ident.split('.').enumerate() {
            if idx > 0 {
                writer.write_char('.')?;
            }

            writer.write_char('"')?;
            writer.write_str(segment)?;
            writer.write_char('"')?;
        }

        Ok(())
    }

    fn explain(&self, sql: &str, vars: &[Value]) -> String {
        explain_sql(sql, Some(&*NUMERIC_PLACEHOLDER), "'", vars)
    }

    fn save_pointer(&self) -> Option<&dyn SavePointer> {
        Some(self)
    }
}

impl SavePointer for PgDialect {
    fn save_point<'a>(&'a self, tx: &'a Db, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            tx.exec(&format!("SAVEPOINT {name}"), &[]).await?;

            Ok(())
        })
    }

    fn rollback_to<'a>(&'a self, tx: &'a Db, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            tx.exec(&format!("ROLLBACK TO SAVEPOINT {name}"), &[]).await?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> PgDialect {
        PgDialect::new(PgConfig::new())
    }

    fn int(data_type: DataType, size: u32) -> Field {
        Field::new("n", data_type).size(size)
    }

    #[test]
    fn it_is_named_postgres() {
        assert_eq!(dialect().name(), "postgres");
    }

    #[test]
    fn it_names_signed_integers_by_size() {
        let d = dialect();

        assert_eq!(d.data_type_of(&int(DataType::Int, 8)), "smallint");
        assert_eq!(d.data_type_of(&int(DataType::Int, 16)), "smallint");
        assert_eq!(d.data_type_of(&int(DataType::Int, 32)), "integer");
        assert_eq!(d.data_type_of(&int(DataType::Int, 64)), "bigint");

        assert_eq!(d.data_type_of(&int(DataType::Int, 16).auto_increment()), "smallserial");
        assert_eq!(d.data_type_of(&int(DataType::Int, 32).auto_increment()), "serial");
        assert_eq!(d.data_type_of(&int(DataType::Int, 64).auto_increment()), "bigserial");
    }

    #[test]
    fn it_widens_unsigned_integers_by_one_bit() {
        let d = dialect();

        assert_eq!(d.data_type_of(&int(DataType::Uint, 15)), "smallint");
        assert_eq!(d.data_type_of(&int(DataType::Uint, 16)), "integer");
        assert_eq!(d.data_type_of(&int(DataType::Uint, 31).auto_increment()), "serial");
        assert_eq!(d.data_type_of(&int(DataType::Uint, 32).auto_increment()), "bigserial");
        assert_eq!(d.data_type_of(&int(DataType::Uint, 32)), "bigint");
        assert_eq!(d.data_type_of(&int(DataType::Uint, u32::MAX)), "bigint");
    }

    #[test]
    fn it_names_floats_by_precision_and_scale() {
        let d = dialect();
        let float = Field::new("f", DataType::Float);

        assert_eq!(d.data_type_of(&float.clone().precision(10).scale(2)), "numeric(10, 2)");
        assert_eq!(d.data_type_of(&float.clone().precision(10)), "numeric(10)");
        assert_eq!(d.data_type_of(&float.clone().scale(2)), "decimal");
        assert_eq!(d.data_type_of(&float), "decimal");
    }

    #[test]
    fn it_names_the_remaining_types() {
        let d = dialect();

        assert_eq!(d.data_type_of(&Field::new("b", DataType::Bool)), "boolean");
        assert_eq!(d.data_type_of(&Field::new("s", DataType::String).size(255)), "varchar(255)");
        assert_eq!(d.data_type_of(&Field::new("s", DataType::String)), "text");
        assert_eq!(d.data_type_of(&Field::new("t", DataType::Time).precision(3)), "timestamptz(3)");
        assert_eq!(d.data_type_of(&Field::new("t", DataType::Time)), "timestamptz");
        assert_eq!(d.data_type_of(&Field::new("y", DataType::Bytes)), "bytea");
        assert_eq!(d.data_type_of(&Field::new("j", DataType::custom("jsonb"))), "jsonb");
    }

    #[test]
    fn it_quotes_identifiers() {
        let d = dialect();

        assert_eq!(d.quote("col"), r#""col""#);
        assert_eq!(d.quote("schema.table"), r#""schema"."table""#);
        assert_eq!(d.quote("db.schema.table"), r#""db"."schema"."table""#);
        assert_eq!(d.quote(r#"we"ird"#), r#""we"ird""#);
    }

    #[test]
    fn it_binds_positional_placeholders() {
        let d = dialect();
        let mut stmt = Statement::new();

        stmt.write_str("INSERT INTO ").unwrap();
        stmt.write_quoted(&d, "users").unwrap();
        stmt.write_str(" (name, age) VALUES (").unwrap();
        stmt.add_var(&d, "ana").unwrap();
        stmt.write_str(", ").unwrap();
        stmt.add_var(&d, 30_i64).unwrap();
        stmt.write_str(")").unwrap();

        assert_eq!(stmt.sql(), r#"INSERT INTO "users" (name, age) VALUES ($1, $2)"#);
    }

    #[test]
    fn it_renders_the_count_of_accumulated_vars() {
        let d = dialect();
        let mut stmt = Statement::new();
        stmt.add_var(&d, 1_i64).unwrap();
        stmt.add_var(&d, 2_i64).unwrap();

        let mut out = String::new();
        d.bind_var_to(&mut out, &stmt, &Value::Int(2)).unwrap();

        assert_eq!(out, "$2");
    }

    #[test]
    fn it_defaults_every_field_to_the_column_default() {
        let d = dialect();

        for field in [
            Field::new("a", DataType::Int).auto_increment(),
            Field::new("b", DataType::String).default_value("'x'"),
        ] {
            assert_eq!(d.default_value_of(&field), Expr::raw("DEFAULT"));
        }
    }

    #[test]
    fn it_explains_numeric_placeholders() {
        let sql = dialect().explain(
            r#"UPDATE "users" SET "name" = $1 WHERE "id" = $2"#,
            &["O'Brien".into(), 7_i64.into()],
        );

        assert_eq!(sql, r#"UPDATE "users" SET "name" = 'O''Brien' WHERE "id" = 7"#);
    }

    #[test]
    fn it_reports_malformed_connection_strings() {
        assert!(matches!(
            PgDialect::open("::not a url::"),
            Err(sqlx_dialect_core::Error::MalformedConnectionString(_))
        ));
    }

    #[test]
    fn it_keeps_the_parsed_parameters() {
        let d = PgDialect::open("postgres://u:p@h/db").unwrap();

        assert_eq!(d.config().get_params().map(|p| p.port()), Some("5432"));
        assert_eq!(d.config().get_dsn(), "postgres://u:p@h/db");
        assert_eq!(d.driver_dsn().unwrap(), "postgres://u:p@h/db");
    }

    #[test]
    fn it_hands_keyword_value_strings_to_the_driver_as_urls() {
        let d = PgDialect::new(PgConfig::new().dsn("host=h user=u dbname=db"));

        assert_eq!(d.driver_dsn().unwrap(), "postgres://u@h:5432/db");
    }
}
