//! Rendering of schema DDL through a [`Dialect`].
//!
//! Only the statements are produced here; applying them is up to the caller.

use crate::db::Db;
use crate::dialect::Dialect;
use crate::schema::Field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Index {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MigratorConfig<'a> {
    pub db: &'a Db,
    pub dialect: &'a dyn Dialect,

    /// Emit indexes as separate statements after `CREATE TABLE` instead of inline.
    pub create_index_after_create_table: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Migrator<'a> {
    config: MigratorConfig<'a>,
}

impl<'a> Migrator<'a> {
    pub fn new(config: MigratorConfig<'a>) -> Self {
        Migrator { config }
    }

    pub fn config(&self) -> &MigratorConfig<'a> {
        &self.config
    }

    pub fn db(&self) -> &'a Db {
        self.config.db
    }

    /// The column definition of `field`: its type followed by any constraints.
    pub fn full_data_type_of(&self, field: &Field) -> String {
        let mut sql = self.config.dialect.data_type_of(field);

        if field.not_null {
            sql.push_str(" NOT NULL");
        }

        if let Some(default) = &field.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }

        sql
    }

    /// The statements creating `table` and its indexes, in execution order.
    pub fn create_table_statements(&self, table: &Table) -> Vec<String> {
        let dialect = self.config.dialect;
        let table_name = dialect.quote(&table.name);

        let mut definitions: Vec<String> = table
            .fields
            .iter()
            .map(|field| format!("{} {}", dialect.quote(&field.name), self.full_data_type_of(field)))
            .collect();

        let primary_keys: Vec<String> = table
            .fields
            .iter()
            .filter(|field| field.primary_key)
            .map(|field| dialect.quote(&field.name))
            .collect();

        if !primary_keys.is_empty() {
            definitions.push(format!("PRIMARY KEY ({})", primary_keys.join(", ")));
        }

        let mut statements = Vec::with_capacity(1 + table.indexes.len());

        if self.config.create_index_after_create_table {
            statements.push(format!("CREATE TABLE {table_name} ({})", definitions.join(", ")));

            for index in &table.indexes {
                statements.push(format!(
                    "CREATE {}INDEX {} ON {table_name} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    dialect.quote(&index.name),
                    self.quote_list(&index.fields),
                ));
            }
        } else {
            for index in &table.indexes {
                definitions.push(format!(
                    "{}INDEX {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    dialect.quote(&index.name),
                    self.quote_list(&index.fields),
                ));
            }

            statements.push(format!("CREATE TABLE {table_name} ({})", definitions.join(", ")));
        }

        statements
    }

    fn quote_list(&self, idents: &[String]) -> String {
        idents
            .iter()
            .map(|ident| self.config.dialect.quote(ident))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
