//! What a spatial calculation operates on.
//!
//! A subject is either a persisted record, referenced in SQL by table, alias
//! and primary key, or an inline geometry literal. Records that have not been
//! saved yet fall back to the literal form of their geometry, so the same
//! calls work before and after a save.

use std::borrow::Cow;

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Geometry;
use crate::registry::SpatialModel;

/// A reference to the geometry column of one stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRef<'a> {
    pub table: Cow<'a, str>,
    pub primary_key: Cow<'a, str>,
    pub id: i64,
    pub column: Cow<'a, str>,
}

impl<'a> PersistedRef<'a> {
    pub fn new(
        table: impl Into<Cow<'a, str>>,
        primary_key: impl Into<Cow<'a, str>>,
        id: i64,
        column: impl Into<Cow<'a, str>>,
    ) -> Self {
        PersistedRef {
            table: table.into(),
            primary_key: primary_key.into(),
            id,
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subject<'a> {
    Persisted(PersistedRef<'a>),
    Literal(Cow<'a, Geometry>),
}

impl<'a> Subject<'a> {
    pub fn persisted(
        table: impl Into<Cow<'a, str>>,
        primary_key: impl Into<Cow<'a, str>>,
        id: i64,
        column: impl Into<Cow<'a, str>>,
    ) -> Self {
        Subject::Persisted(PersistedRef::new(table, primary_key, id, column))
    }

    pub fn literal(geometry: &'a Geometry) -> Self {
        Subject::Literal(Cow::Borrowed(geometry))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Subject::Persisted(_))
    }
}

impl From<Geometry> for Subject<'static> {
    fn from(value: Geometry) -> Self {
        Subject::Literal(Cow::Owned(value))
    }
}

impl<'a> From<&'a Geometry> for Subject<'a> {
    fn from(value: &'a Geometry) -> Self {
        Subject::literal(value)
    }
}

/// Anything that can stand in a spatial calculation.
pub trait AsSubject {
    fn as_subject(&self) -> SpatialResult<Subject<'_>>;

    /// The geometry held in memory, if any. Used for client-side helpers
    /// that only need the SRID or the coordinates.
    fn loaded_geometry(&self) -> Option<&Geometry> {
        None
    }
}

impl AsSubject for Geometry {
    fn as_subject(&self) -> SpatialResult<Subject<'_>> {
        Ok(Subject::literal(self))
    }

    fn loaded_geometry(&self) -> Option<&Geometry> {
        Some(self)
    }
}

impl AsSubject for Subject<'_> {
    fn as_subject(&self) -> SpatialResult<Subject<'_>> {
        Ok(self.clone())
    }

    fn loaded_geometry(&self) -> Option<&Geometry> {
        match self {
            Subject::Literal(geometry) => Some(&**geometry),
            Subject::Persisted(_) => None,
        }
    }
}

/// The subject form of a model's primary geometry column. Derived models
/// route their [`AsSubject`] impl through here.
pub fn model_subject<M: SpatialModel>(model: &M) -> SpatialResult<Subject<'_>> {
    column_subject(model, M::primary_geometry_column())
}

/// The subject form of one geometry column of a model.
///
/// # Errors
///
/// Returns `InvalidOperation` if the record is unsaved and the column holds
/// no geometry.
pub fn column_subject<'a, M: SpatialModel>(model: &'a M, column: &'a str) -> SpatialResult<Subject<'a>> {
    if let Some(id) = model.record_id() {
        return Ok(Subject::persisted(M::table_name(), M::primary_key(), id, column));
    }

    match model.geometry(column) {
        Some(geometry) => Ok(Subject::literal(geometry)),
        None => {
            log::error!(
                "Unsaved {} record has no geometry in column {}",
                M::table_name(),
                column
            );
            Err(SpatialError::InvalidOperation(format!(
                "unsaved {} record has no geometry in column '{}'",
                M::table_name(),
                column
            )))
        }
    }
}

/// A model viewed through one of its geometry columns other than the
/// primary one.
#[derive(Debug)]
pub struct ColumnRef<'a, M> {
    model: &'a M,
    column: &'a str,
}

impl<'a, M: SpatialModel> ColumnRef<'a, M> {
    pub fn new(model: &'a M, column: &'a str) -> Self {
        ColumnRef { model, column }
    }
}

impl<M: SpatialModel> AsSubject for ColumnRef<'_, M> {
    fn as_subject(&self) -> SpatialResult<Subject<'_>> {
        column_subject(self.model, self.column)
    }

    fn loaded_geometry(&self) -> Option<&Geometry> {
        self.model.geometry(self.column)
    }
}
