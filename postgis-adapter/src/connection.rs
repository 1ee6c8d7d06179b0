//! The database seam.
//!
//! The adapter never talks to a driver directly. Everything it runs goes
//! through [`SpatialConnection`], which takes finished SQL text and hands back
//! values as text, the form PostGIS uses for geometries in the simple query
//! protocol (hex EWKB). A `postgres`-backed implementation ships behind the
//! `postgres` feature; tests supply their own.

use std::ops::Deref;
use std::sync::Arc;

use crate::errors::SpatialResult;

/// One result row. Column names are shared between the rows of a result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Row { columns, values }
    }

    /// Value of the named column. `None` if the column is absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.get_index(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A connection able to run SQL text.
///
/// Implementations must be safe to share between threads; the adapter holds
/// one connection and issues statements from `&self`.
pub trait SpatialConnection: Send + Sync {
    /// Runs a statement and returns the number of affected rows.
    fn execute(&self, sql: &str) -> SpatialResult<u64>;

    /// Runs a query and returns the first column of the first row, or `None`
    /// when there is no row or the value is NULL.
    fn select_value(&self, sql: &str) -> SpatialResult<Option<String>>;

    fn select_rows(&self, sql: &str) -> SpatialResult<Vec<Row>>;

    fn quote_identifier(&self, identifier: &str) -> String {
        quote_identifier(identifier)
    }

    fn quote_string(&self, text: &str) -> String {
        quote_string(text)
    }
}

impl<T: SpatialConnection + ?Sized> SpatialConnection for Arc<T> {
    fn execute(&self, sql: &str) -> SpatialResult<u64> {
        self.deref().execute(sql)
    }

    fn select_value(&self, sql: &str) -> SpatialResult<Option<String>> {
        self.deref().select_value(sql)
    }

    fn select_rows(&self, sql: &str) -> SpatialResult<Vec<Row>> {
        self.deref().select_rows(sql)
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        self.deref().quote_identifier(identifier)
    }

    fn quote_string(&self, text: &str) -> String {
        self.deref().quote_string(text)
    }
}

impl<T: SpatialConnection + ?Sized> SpatialConnection for &T {
    fn execute(&self, sql: &str) -> SpatialResult<u64> {
        (**self).execute(sql)
    }

    fn select_value(&self, sql: &str) -> SpatialResult<Option<String>> {
        (**self).select_value(sql)
    }

    fn select_rows(&self, sql: &str) -> SpatialResult<Vec<Row>> {
        (**self).select_rows(sql)
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        (**self).quote_identifier(identifier)
    }

    fn quote_string(&self, text: &str) -> String {
        (**self).quote_string(text)
    }
}

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Single-quotes a string literal, doubling embedded quotes.
pub fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
