//! Conversion of text-protocol rows into model values.

use crate::connection::Row;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Geometry;

/// A value that can be read from the text form of one column.
pub trait FromSqlText: Sized {
    fn from_sql_text(text: Option<&str>) -> SpatialResult<Self>;
}

/// A model that can be built from one result row.
pub trait FromSpatialRow: Sized {
    fn from_spatial_row(row: &Row) -> SpatialResult<Self>;
}

fn required<'a>(text: Option<&'a str>, type_name: &str) -> SpatialResult<&'a str> {
    text.ok_or_else(|| {
        log::error!("NULL where {} was expected", type_name);
        SpatialError::Decode(format!("unexpected NULL for {}", type_name))
    })
}

macro_rules! parsed_from_text {
    ($($ty:ty),*) => {
        $(
            impl FromSqlText for $ty {
                fn from_sql_text(text: Option<&str>) -> SpatialResult<Self> {
                    let text = required(text, stringify!($ty))?;
                    text.trim().parse::<$ty>().map_err(|err| {
                        log::error!("Cannot read {:?} as {}: {}", text, stringify!($ty), err);
                        SpatialError::Decode(format!("'{}' is not a valid {}: {}", text, stringify!($ty), err))
                    })
                }
            }
        )*
    };
}

parsed_from_text!(i16, i32, i64, u32, u64, f32, f64);

impl FromSqlText for bool {
    fn from_sql_text(text: Option<&str>) -> SpatialResult<Self> {
        match required(text, "bool")? {
            "t" | "true" | "TRUE" => Ok(true),
            "f" | "false" | "FALSE" => Ok(false),
            other => Err(SpatialError::Decode(format!("'{}' is not a boolean", other))),
        }
    }
}

impl FromSqlText for String {
    fn from_sql_text(text: Option<&str>) -> SpatialResult<Self> {
        required(text, "String").map(str::to_string)
    }
}

impl FromSqlText for Geometry {
    fn from_sql_text(text: Option<&str>) -> SpatialResult<Self> {
        Geometry::from_hex_ewkb(required(text, "Geometry")?)
    }
}

impl<T: FromSqlText> FromSqlText for Option<T> {
    fn from_sql_text(text: Option<&str>) -> SpatialResult<Self> {
        match text {
            None => Ok(None),
            Some(text) => T::from_sql_text(Some(text)).map(Some),
        }
    }
}

impl Row {
    /// Reads `column` as `T`. A missing column reads as NULL.
    pub fn decode<T: FromSqlText>(&self, column: &str) -> SpatialResult<T> {
        T::from_sql_text(self.get(column)).map_err(|err| match err {
            SpatialError::Decode(message) => SpatialError::Decode(format!("column '{}': {}", column, message)),
            other => other,
        })
    }
}
