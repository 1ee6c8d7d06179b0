//! Geometry capability registry.
//!
//! Models declare their geometry columns through [`SpatialModel`], usually by
//! deriving it. A declared subtype decides which spatial function family the
//! model gets: the derive attaches one of the marker traits below, and the
//! function traits in [`crate::functions`] are only implemented for subjects
//! carrying the matching marker.
//!
//! Columns declared without a subtype are resolved at runtime through
//! [`GeomRegistry`], which consults the `geometry_columns` catalog and caches
//! what it finds per table.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::config::{DEFAULT_GEOMETRY_COLUMN, DEFAULT_PRIMARY_KEY};
use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::geometry::Geometry;
use crate::schema::{catalog, GeometryType, SpatialColumn};
use crate::subject::{AsSubject, ColumnRef, Subject};

/// A geometry column as declared on a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeomColumnDecl {
    pub name: &'static str,
    /// `None` when the subtype is left to the catalog.
    pub kind: Option<GeometryType>,
    pub srid: Option<i32>,
}

impl GeomColumnDecl {
    pub const fn new(name: &'static str, kind: Option<GeometryType>, srid: Option<i32>) -> Self {
        GeomColumnDecl { name, kind, srid }
    }
}

/// A record type stored in a table with one or more geometry columns.
pub trait SpatialModel {
    fn table_name() -> &'static str;

    fn primary_key() -> &'static str {
        DEFAULT_PRIMARY_KEY
    }

    /// Declared geometry columns, the primary one first.
    fn geometry_columns() -> &'static [GeomColumnDecl];

    /// The primary key value, `None` while the record is unsaved.
    fn record_id(&self) -> Option<i64>;

    fn geometry(&self, column: &str) -> Option<&Geometry>;

    fn set_geometry(&mut self, column: &str, geometry: Geometry) -> SpatialResult<()>;

    /// The column spatial functions operate on by default.
    fn primary_geometry_column() -> &'static str {
        Self::geometry_columns()
            .first()
            .map(|decl| decl.name)
            .unwrap_or(DEFAULT_GEOMETRY_COLUMN)
    }

    fn primary_geometry(&self) -> Option<&Geometry> {
        self.geometry(Self::primary_geometry_column())
    }

    fn declaration(column: &str) -> Option<&'static GeomColumnDecl> {
        Self::geometry_columns().iter().find(|decl| decl.name == column)
    }

    /// The subtype declared for `column`, if any.
    fn declared_geometry_type(column: &str) -> Option<GeometryType> {
        Self::declaration(column).and_then(|decl| decl.kind)
    }

    fn declared_srid(column: &str) -> Option<i32> {
        Self::declaration(column).and_then(|decl| decl.srid)
    }
}

/// Subjects that get the point function family.
pub trait PointGeometry: AsSubject {}

/// Subjects that get the line string function family.
pub trait LineStringGeometry: AsSubject {}

/// Subjects that get the polygon function family.
pub trait PolygonGeometry: AsSubject {}

// Literals carry every family; invalid pairings fail in the database.
impl PointGeometry for Geometry {}
impl LineStringGeometry for Geometry {}
impl PolygonGeometry for Geometry {}

impl PointGeometry for Subject<'_> {}
impl LineStringGeometry for Subject<'_> {}
impl PolygonGeometry for Subject<'_> {}

// Secondary columns are not declared with a family of their own.
impl<M: SpatialModel> PointGeometry for ColumnRef<'_, M> {}
impl<M: SpatialModel> LineStringGeometry for ColumnRef<'_, M> {}
impl<M: SpatialModel> PolygonGeometry for ColumnRef<'_, M> {}

/// The function family a declared subtype unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Point,
    LineString,
    Polygon,
    /// Common and bounding-box functions only.
    Common,
}

impl Capability {
    /// Multi line strings share the line string family and multi polygons
    /// the polygon family. Everything else gets the common functions only.
    pub fn for_type(geometry_type: GeometryType) -> Capability {
        match geometry_type {
            GeometryType::Point => Capability::Point,
            GeometryType::LineString | GeometryType::MultiLineString => Capability::LineString,
            GeometryType::Polygon | GeometryType::MultiPolygon => Capability::Polygon,
            _ => Capability::Common,
        }
    }
}

/// Conversion from the primary key field types a derived model may use.
pub trait ToRecordId {
    fn to_record_id(&self) -> Option<i64>;
}

impl ToRecordId for i64 {
    fn to_record_id(&self) -> Option<i64> {
        Some(*self)
    }
}

impl ToRecordId for i32 {
    fn to_record_id(&self) -> Option<i64> {
        Some(i64::from(*self))
    }
}

impl<T: ToRecordId> ToRecordId for Option<T> {
    fn to_record_id(&self) -> Option<i64> {
        self.as_ref().and_then(ToRecordId::to_record_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Declared {
    kind: Option<GeometryType>,
    srid: Option<i32>,
}

/// Runtime registry of declared geometry columns and catalog descriptors.
///
/// Declared subtypes always win. Undeclared ones are looked up in the
/// catalog and cached per table until [`GeomRegistry::invalidate`] is called,
/// which the schema statements do after every DDL statement on the table.
/// Lookups never fail: a table the catalog does not know resolves to
/// [`GeometryType::Unknown`] and nothing is cached for it.
#[derive(Debug, Default)]
pub struct GeomRegistry {
    declared: DashMap<String, HashMap<String, Declared>>,
    catalog: DashMap<String, HashMap<String, SpatialColumn>>,
}

impl GeomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every geometry column `M` declares.
    pub fn register<M: SpatialModel>(&self) {
        let mut entry = self.declared.entry(M::table_name().to_string()).or_default();
        for decl in M::geometry_columns() {
            entry.insert(
                decl.name.to_string(),
                Declared {
                    kind: decl.kind,
                    srid: decl.srid,
                },
            );
        }
        log::debug!(
            "Registered {} geometry column(s) for {}",
            M::geometry_columns().len(),
            M::table_name()
        );
    }

    pub fn declare(&self, table: &str, column: &str, kind: Option<GeometryType>, srid: Option<i32>) {
        self.declared
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), Declared { kind, srid });
    }

    pub fn is_registered(&self, table: &str) -> bool {
        self.declared.contains_key(table)
    }

    /// The subtype of `table.column`: declared, else catalog, else
    /// [`GeometryType::Unknown`].
    pub fn geometry_type<C: SpatialConnection + ?Sized>(
        &self,
        connection: &C,
        table: &str,
        column: &str,
    ) -> GeometryType {
        if let Some(kind) = self.declared_field(table, column, |d| d.kind) {
            return kind;
        }
        self.descriptor(connection, table, column)
            .map(|descriptor| descriptor.geometry_type)
            .unwrap_or(GeometryType::Unknown)
    }

    /// The SRID of `table.column`: declared, else catalog.
    pub fn srid<C: SpatialConnection + ?Sized>(&self, connection: &C, table: &str, column: &str) -> Option<i32> {
        self.declared_field(table, column, |d| d.srid)
            .or_else(|| self.descriptor(connection, table, column).map(|d| d.srid))
    }

    pub fn capability<C: SpatialConnection + ?Sized>(
        &self,
        connection: &C,
        table: &str,
        column: &str,
    ) -> Capability {
        Capability::for_type(self.geometry_type(connection, table, column))
    }

    /// The catalog descriptor of `table.column`, loading and caching the
    /// table's entries on first use.
    pub fn descriptor<C: SpatialConnection + ?Sized>(
        &self,
        connection: &C,
        table: &str,
        column: &str,
    ) -> Option<SpatialColumn> {
        if let Some(columns) = self.catalog.get(table) {
            return columns.get(column).cloned();
        }

        match catalog::spatial_info(connection, table) {
            Ok(columns) if columns.is_empty() => {
                log::debug!("No catalog entries for {}", table);
                None
            }
            Ok(columns) => {
                let found = columns.get(column).cloned();
                self.catalog.insert(table.to_string(), columns);
                found
            }
            Err(err) => {
                log::warn!("Geometry type of {}.{} is unknown: {}", table, column, err);
                None
            }
        }
    }

    /// Drops cached catalog descriptors of `table`.
    pub fn invalidate(&self, table: &str) {
        if self.catalog.remove(table).is_some() {
            log::debug!("Invalidated spatial descriptors of {}", table);
        }
    }

    pub fn clear(&self) {
        self.catalog.clear();
    }

    fn declared_field<T>(&self, table: &str, column: &str, field: impl Fn(&Declared) -> Option<T>) -> Option<T> {
        self.declared
            .get(table)
            .and_then(|columns| columns.get(column).and_then(&field))
    }
}
