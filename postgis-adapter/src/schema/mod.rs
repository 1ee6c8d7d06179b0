//! Geometry-aware schema migrations and column introspection.

pub mod catalog;
pub mod column;
pub mod geometry_type;
pub mod statements;
pub mod table_definition;

pub use catalog::IndexDefinition;
pub use column::{Column, ColumnOptions, SpatialColumn};
pub use geometry_type::GeometryType;
pub use statements::{index_name, IndexOptions, SchemaStatements, TableOptions};
pub use table_definition::{ColumnDefinition, GeometryColumnDefinition, TableDefinition};
