use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::geometry::Geometry;

use super::parameter::render_float;

/// A value written into INSERT/UPDATE statements.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Geometry(Geometry),
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Geometry> for SqlValue {
    fn from(value: Geometry) -> Self {
        SqlValue::Geometry(value)
    }
}

impl From<&Geometry> for SqlValue {
    fn from(value: &Geometry) -> Self {
        SqlValue::Geometry(value.clone())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Quoting that understands geometry values.
///
/// Geometries are written as their hex EWKB in a plain string literal,
/// `'0101000020E6100000...'`, which PostgreSQL casts to the column's
/// geometry type on assignment. Every other value defers to the connection's
/// own quoting.
pub trait SpatialQuoting {
    fn quote_value(&self, value: &SqlValue) -> SpatialResult<String>;
}

impl<C: SpatialConnection + ?Sized> SpatialQuoting for C {
    fn quote_value(&self, value: &SqlValue) -> SpatialResult<String> {
        match value {
            SqlValue::Null => Ok("NULL".to_string()),
            SqlValue::Bool(true) => Ok("TRUE".to_string()),
            SqlValue::Bool(false) => Ok("FALSE".to_string()),
            SqlValue::Integer(value) => Ok(value.to_string()),
            SqlValue::Float(value) => render_float(*value),
            SqlValue::Text(text) => Ok(self.quote_string(text)),
            SqlValue::Geometry(geometry) => Ok(format!("'{}'", geometry.as_hex_ewkb()?)),
        }
    }
}
