//! Everything needed to use the spatial API on models.
//!
//! ```rust,ignore
//! use postgis_adapter::prelude::*;
//! ```

pub use crate::adapter::SpatialAdapter;
pub use crate::config::{FunctionNaming, SpatialConfig};
pub use crate::connection::{Row, SpatialConnection};
pub use crate::errors::{SpatialError, SpatialResult};
pub use crate::finder::{FindQuery, Finder};
pub use crate::functions::{
    DistanceUnit, GeomRef, LineStringFunctions, PointFunctions, PolygonFunctions, RecordMut,
    SpatialCalculation,
};
pub use crate::geometry::{BoundingBox, Coordinate, Geometry};
#[cfg(feature = "postgres")]
pub use crate::pg::PgConnection;
pub use crate::registry::{
    GeomColumnDecl, LineStringGeometry, PointGeometry, PolygonGeometry, SpatialModel, ToRecordId,
};
pub use crate::row::{FromSpatialRow, FromSqlText};
pub use crate::schema::{ColumnOptions, GeometryType, IndexOptions, SchemaStatements, TableOptions};
pub use crate::sort_order::SortOrder;
pub use crate::sql::{BboxOperator, Calculation, SpatialFunction, Spheroid};
pub use crate::subject::{AsSubject, ColumnRef, Subject};
