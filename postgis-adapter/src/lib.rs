//! # PostGIS Adapter - Spatial Functions for Record Models
//!
//! This crate gives record types stored in PostgreSQL/PostGIS tables a typed
//! spatial API. Predicates, measurements and derived geometries are computed
//! by the database: every call renders exactly one `SELECT` and decodes its
//! single result value.
//!
//! ## Features
//!
//! - **Hex EWKB codec**: Geometry values with Z, M and SRID, encoded the way
//!   PostGIS prints them
//! - **Subject references**: Saved records are referenced by table, alias and
//!   primary key; unsaved ones fall back to inline literals
//! - **Typed function families**: Point, line string and polygon functions
//!   are only available on models declaring the matching subtype
//! - **Bounding-box operators**: All thirteen PostGIS box comparisons
//! - **Finders**: Nearest, farthest, containing and measurement-ordered
//!   record queries
//! - **Schema statements**: `AddGeometryColumn`, GIST indexes and catalog
//!   introspection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use postgis_adapter::prelude::*;
//! use postgis_adapter_derive::SpatialModel;
//!
//! #[derive(SpatialModel)]
//! #[spatial(table = "cities")]
//! struct City {
//!     #[spatial(id)]
//!     id: Option<i64>,
//!     name: String,
//!     #[geom(kind = "polygon", srid = 4326)]
//!     geom: Option<Geometry>,
//! }
//!
//! # fn main() -> SpatialResult<()> {
//! let adapter = SpatialAdapter::new(PgConnection::connect("postgresql://localhost/gis")?);
//! adapter.register::<City>();
//!
//! let here = Geometry::point(-47.88, -15.79, 4326);
//! if let Some(city) = adapter.finder::<City>().contain(&here)? {
//!     println!("{} covers {} square degrees", city.name, adapter.geom(&city).area()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod connection;
pub mod errors;
pub mod executor;
pub mod finder;
pub mod functions;
pub mod geometry;
#[cfg(feature = "postgres")]
pub mod pg;
pub mod prelude;
pub mod registry;
pub mod row;
pub mod schema;
pub mod sort_order;
pub mod sql;
pub mod subject;

#[cfg(test)]
mod test_support;

pub use adapter::SpatialAdapter;
pub use config::{FunctionNaming, SpatialConfig, SpatialConfigBuilder};
pub use connection::{Row, SpatialConnection};
pub use errors::{SpatialError, SpatialResult};
pub use geometry::{BoundingBox, Coordinate, Geometry, GeometryKind};
#[cfg(feature = "postgres")]
pub use pg::PgConnection;
pub use registry::{GeomColumnDecl, GeomRegistry, SpatialModel};
pub use sort_order::SortOrder;
