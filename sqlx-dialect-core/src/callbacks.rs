//! The default statement-building chain of the ORM runtime.
//!
//! A dialect picks, at initialization, which clauses each operation is built from;
//! most importantly whether writes end in a `RETURNING` clause.

pub const CREATE_CLAUSES: &[&str] = &["INSERT", "VALUES", "ON CONFLICT"];
pub const QUERY_CLAUSES: &[&str] = &["SELECT", "FROM", "WHERE", "GROUP BY", "ORDER BY", "LIMIT", "FOR"];
pub const UPDATE_CLAUSES: &[&str] = &["UPDATE", "SET", "WHERE"];
pub const DELETE_CLAUSES: &[&str] = &["DELETE", "FROM", "WHERE"];

const RETURNING: &str = "RETURNING";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Query,
    Update,
    Delete,
}

/// Configuration for [`Callbacks::with_config`].
///
/// Clause lists left empty fall back to the runtime defaults.
#[derive(Debug, Clone, Default)]
pub struct CallbacksConfig {
    pub with_returning: bool,
    pub create_clauses: Vec<&'static str>,
    pub query_clauses: Vec<&'static str>,
    pub update_clauses: Vec<&'static str>,
    pub delete_clauses: Vec<&'static str>,
}

impl CallbacksConfig {
    pub fn with_returning(with_returning: bool) -> Self {
        CallbacksConfig {
            with_returning,
            ..Default::default()
        }
    }
}

/// The clause order used to build each kind of statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Callbacks {
    create: Vec<&'static str>,
    query: Vec<&'static str>,
    update: Vec<&'static str>,
    delete: Vec<&'static str>,
}

impl Callbacks {
    pub fn with_config(config: &CallbacksConfig) -> Self {
        fn or_default(clauses: &[&'static str], default: &[&'static str]) -> Vec<&'static str> {
            if clauses.is_empty() {
                default.to_vec()
            } else {
                clauses.to_vec()
            }
        }

        let mut callbacks = Callbacks {
            create: or_default(&config.create_clauses, CREATE_CLAUSES),
            query: or_default(&config.query_clauses, QUERY_CLAUSES),
            update: or_default(&config.update_clauses, UPDATE_CLAUSES),
            delete: or_default(&config.delete_clauses, DELETE_CLAUSES),
        };

        if config.with_returning {
            for clauses in [
                &mut callbacks.create,
                &mut callbacks.update,
                &mut callbacks.delete,
            ] {
                if !clauses.contains(&RETURNING) {
                    clauses.push(RETURNING);
                }
            }
        }

        callbacks
    }

    pub fn clauses(&self, op: Operation) -> &[&'static str] {
        match op {
            Operation::Create => &self.create,
            Operation::Query => &self.query,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
        }
    }

    pub fn supports_returning(&self, op: Operation) -> bool {
        self.clauses(op).contains(&RETURNING)
    }
}
