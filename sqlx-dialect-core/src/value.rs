use chrono::{DateTime, Utc};

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
}

impl Value {
    /// Whether the literal form of this value is quoted when written into SQL.
    pub fn is_string_like(&self) -> bool {
        matches!(self, Value::Text(_) | Value::Time(_) | Value::Bytes(_))
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    f32 => Float,
    f64 => Float,
    String => Text,
    &'_ str => Text,
    Vec<u8> => Bytes,
    &'_ [u8] => Bytes,
    DateTime<Utc> => Time,
);

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
