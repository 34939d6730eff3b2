//! Schema metadata handed to a [`Dialect`][crate::Dialect] by the ORM runtime.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// The semantic type of a field, independent of any database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DataType {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Time,
    Bytes,

    /// A type tag the ORM runtime does not know about, passed through to the dialect as-is.
    Custom(Cow<'static, str>),
}

impl DataType {
    pub fn custom(tag: impl Into<Cow<'static, str>>) -> Self {
        DataType::Custom(tag.into())
    }

    /// The raw type tag.
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Uint => "uint",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Time => "time",
            DataType::Bytes => "bytes",
            DataType::Custom(tag) => tag,
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a single column of a model.
///
/// Dialects only ever read a `Field`; the ORM runtime owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,

    /// Declared size in bits for integers, or characters for strings. `0` means unspecified.
    pub size: u32,
    pub precision: u32,
    pub scale: u32,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub not_null: bool,

    /// Whether the column carries a declared default at schema-definition time.
    pub default_value: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Field {
            name: name.into(),
            data_type,
            size: 0,
            precision: 0,
            scale: 0,
            auto_increment: false,
            primary_key: false,
            not_null: false,
            default_value: None,
        }
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the field as the primary key; primary keys are implicitly `NOT NULL`.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }
}
