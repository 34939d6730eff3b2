use std::fmt::Write;
use std::time::{Duration, Instant};

use log::LevelFilter;
use regex::{Captures, Regex};

use crate::dialect::Dialect;
use crate::value::Value;

// Yes these look silly. `tracing` doesn't currently support dynamic levels
// https://github.com/tokio-rs/tracing/issues/372
#[doc(hidden)]
#[macro_export]
macro_rules! private_tracing_dynamic_enabled {
    (target: $target:expr, $level:expr) => {{
        use ::tracing::Level;

        match $level {
            Level::ERROR => ::tracing::enabled!(target: $target, Level::ERROR),
            Level::WARN => ::tracing::enabled!(target: $target, Level::WARN),
            Level::INFO => ::tracing::enabled!(target: $target, Level::INFO),
            Level::DEBUG => ::tracing::enabled!(target: $target, Level::DEBUG),
            Level::TRACE => ::tracing::enabled!(target: $target, Level::TRACE),
        }
    }};
    ($level:expr) => {{
        $crate::private_tracing_dynamic_enabled!(target: module_path!(), $level)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! private_tracing_dynamic_event {
    (target: $target:expr, $level:expr, $($args:tt)*) => {{
        use ::tracing::Level;

        match $level {
            Level::ERROR => ::tracing::event!(target: $target, Level::ERROR, $($args)*),
            Level::WARN => ::tracing::event!(target: $target, Level::WARN, $($args)*),
            Level::INFO => ::tracing::event!(target: $target, Level::INFO, $($args)*),
            Level::DEBUG => ::tracing::event!(target: $target, Level::DEBUG, $($args)*),
            Level::TRACE => ::tracing::event!(target: $target, Level::TRACE, $($args)*),
        }
    }};
}

#[doc(hidden)]
pub fn private_level_filter_to_levels(
    filter: LevelFilter,
) -> Option<(tracing::Level, log::Level)> {
    let tracing_level = match filter {
        LevelFilter::Error => Some(tracing::Level::ERROR),
        LevelFilter::Warn => Some(tracing::Level::WARN),
        LevelFilter::Info => Some(tracing::Level::INFO),
        LevelFilter::Debug => Some(tracing::Level::DEBUG),
        LevelFilter::Trace => Some(tracing::Level::TRACE),
        LevelFilter::Off => None,
    };

    tracing_level.zip(filter.to_level())
}

/// Controls how statements executed through a [`Db`][crate::Db] are logged.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct LogSettings {
    pub statements_level: LevelFilter,
    pub slow_statements_level: LevelFilter,
    pub slow_statements_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            statements_level: LevelFilter::Debug,
            slow_statements_level: LevelFilter::Warn,
            slow_statements_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    pub fn log_statements(&mut self, level: LevelFilter) {
        self.statements_level = level;
    }

    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_statements_level = level;
        self.slow_statements_duration = duration;
    }
}

pub(crate) struct QueryLogger<'q> {
    sql: &'q str,
    vars: &'q [Value],
    dialect: &'q dyn Dialect,
    rows_affected: u64,
    failed: bool,
    start: Instant,
    settings: &'q LogSettings,
}

impl<'q> QueryLogger<'q> {
    pub(crate) fn new(
        sql: &'q str,
        vars: &'q [Value],
        dialect: &'q dyn Dialect,
        settings: &'q LogSettings,
    ) -> Self {
        Self {
            sql,
            vars,
            dialect,
            rows_affected: 0,
            failed: false,
            start: Instant::now(),
            settings,
        }
    }

    pub(crate) fn increase_rows_affected(&mut self, n: u64) {
        self.rows_affected += n;
    }

    pub(crate) fn fail(&mut self) {
        self.failed = true;
    }

    pub(crate) fn finish(&self) {
        let elapsed = self.start.elapsed();

        let was_slow = elapsed >= self.settings.slow_statements_duration;

        let lvl = if was_slow {
            self.settings.slow_statements_level
        } else {
            self.settings.statements_level
        };

        if let Some((tracing_level, log_level)) = private_level_filter_to_levels(lvl) {
            // The enabled level could be set from either tracing world or log world, so check both
            // to see if logging should be enabled for our level
            let log_is_enabled = log::log_enabled!(target: "sqlx_dialect::query", log_level)
                || private_tracing_dynamic_enabled!(target: "sqlx_dialect::query", tracing_level);

            if log_is_enabled {
                let summary = parse_query_summary(self.sql);
                let statement = self.dialect.explain(self.sql, self.vars);

                if was_slow {
                    private_tracing_dynamic_event!(
                        target: "sqlx_dialect::query",
                        tracing_level,
                        summary,
                        db.statement = statement,
                        db.system = self.dialect.name(),
                        rows_affected = self.rows_affected,
                        failed = self.failed,
                        ?elapsed,
                        elapsed_secs = elapsed.as_secs_f64(),
                        slow_threshold = ?self.settings.slow_statements_duration,
                        "slow statement: execution time exceeded alert threshold"
                    );
                } else {
                    private_tracing_dynamic_event!(
                        target: "sqlx_dialect::query",
                        tracing_level,
                        summary,
                        db.statement = statement,
                        db.system = self.dialect.name(),
                        rows_affected = self.rows_affected,
                        failed = self.failed,
                        ?elapsed,
                        elapsed_secs = elapsed.as_secs_f64(),
                    );
                }
            }
        }
    }
}

impl Drop for QueryLogger<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

pub fn parse_query_summary(sql: &str) -> String {
    // For now, just take the first 4 words
    sql.split_whitespace()
        .take(4)
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Renders `sql` with its placeholders replaced by the literal form of `vars`, for logging.
///
/// With `placeholder` set, every match whose first capture group is a 1-based index
/// (e.g. `\$(\d+)`) is replaced by the corresponding variable; matches without a
/// variable are left untouched. Without it, each `?` consumes the next variable.
///
/// String-like values are wrapped in `escaper`, with embedded escapers doubled.
/// The output is meant for humans and must never be sent to a database.
pub fn explain_sql(sql: &str, placeholder: Option<&Regex>, escaper: &str, vars: &[Value]) -> String {
    let literals: Vec<String> = vars.iter().map(|v| format_literal(v, escaper)).collect();

    match placeholder {
        Some(regex) => regex
            .replace_all(sql, |caps: &Captures<'_>| {
                caps.get(1)
                    .and_then(|idx| idx.as_str().parse::<usize>().ok())
                    .and_then(|idx| idx.checked_sub(1))
                    .and_then(|idx| literals.get(idx))
                    .map_or_else(|| caps[0].to_owned(), Clone::clone)
            })
            .into_owned(),

        None => {
            let mut out = String::with_capacity(sql.len());
            let mut literals = literals.iter();

            for c in sql.chars() {
                if c == '?' {
                    if let Some(literal) = literals.next() {
                        out.push_str(literal);
                        continue;
                    }
                }

                out.push(c);
            }

            out
        }
    }
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

fn format_literal(value: &Value, escaper: &str) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Uint(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Text(v) => quote_literal(v, escaper),
        Value::Time(v) => quote_literal(&v.format(TIME_FORMAT).to_string(), escaper),
        Value::Bytes(v) => match std::str::from_utf8(v) {
            Ok(s) if s.chars().all(|c| !c.is_control() || c.is_whitespace()) => {
                quote_literal(s, escaper)
            }
            _ => "<binary>".to_owned(),
        },
    }
}

fn quote_literal(s: &str, escaper: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2 * escaper.len());
    // writing into a `String` cannot fail
    let _ = write!(
        out,
        "{escaper}{}{escaper}",
        s.replace(escaper, &escaper.repeat(2))
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn numeric() -> Regex {
        Regex::new(r"\$(\d+)").unwrap()
    }

    #[test]
    fn it_substitutes_numeric_placeholders() {
        let sql = explain_sql(
            "SELECT * FROM users WHERE name = $1 AND age > $2 AND active = $3",
            Some(&numeric()),
            "'",
            &["ana".into(), 30_i64.into(), true.into()],
        );

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE name = 'ana' AND age > 30 AND active = true"
        );
    }

    #[test]
    fn it_handles_multi_digit_and_out_of_range_placeholders() {
        let vars: Vec<Value> = (1..=10_i64).map(Value::from).collect();

        let sql = explain_sql("$10, $1, $11", Some(&numeric()), "'", &vars);

        assert_eq!(sql, "10, 1, $11");
    }

    #[test]
    fn it_doubles_embedded_escapers() {
        let sql = explain_sql("$1", Some(&numeric()), "'", &["it's".into()]);

        assert_eq!(sql, "'it''s'");
    }

    #[test]
    fn it_formats_null_time_and_bytes() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let sql = explain_sql(
            "$1 $2 $3 $4",
            Some(&numeric()),
            "'",
            &[
                Value::Null,
                at.into(),
                b"abc".as_slice().into(),
                vec![0_u8, 159, 146, 150].into(),
            ],
        );

        assert_eq!(sql, "NULL '2024-01-02 03:04:05' 'abc' <binary>");
    }

    #[test]
    fn it_substitutes_question_marks_in_order() {
        let sql = explain_sql("a = ? AND b = ? AND c = ?", None, "'", &[1_i64.into(), "x".into()]);

        assert_eq!(sql, "a = 1 AND b = 'x' AND c = ?");
    }

    #[test]
    fn it_summarizes_queries() {
        assert_eq!(
            parse_query_summary("SELECT  id,\n name FROM users WHERE id = $1"),
            "SELECT id, name FROM"
        );
    }
}
