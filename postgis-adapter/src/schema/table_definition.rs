use crate::connection::quote_string;
use crate::sql::identifier;

use super::{ColumnOptions, GeometryType};

/// A plain (non-geometry) column in a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    pub null: bool,
    pub default: Option<String>,
}

impl ColumnDefinition {
    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", identifier(&self.name), self.sql_type);
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if !self.null {
            sql.push_str(" NOT NULL");
        }
        sql
    }
}

/// A geometry column. PostGIS registers these through `AddGeometryColumn`
/// rather than inline in `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryColumnDefinition {
    pub name: String,
    pub geometry_type: GeometryType,
    pub options: ColumnOptions,
}

impl GeometryColumnDefinition {
    pub fn new(name: impl Into<String>, geometry_type: GeometryType, options: ColumnOptions) -> Self {
        GeometryColumnDefinition {
            name: name.into(),
            geometry_type,
            options,
        }
    }

    /// The type argument of `AddGeometryColumn`: `POINT`, or `POINTM` for a
    /// measured column without Z.
    pub fn ddl_type_name(&self) -> String {
        let mut name = self.geometry_type.sql_name().to_string();
        if self.options.with_m && !self.options.with_z {
            name.push('M');
        }
        name
    }

    pub fn dimension(&self) -> u8 {
        2 + self.options.with_z as u8 + self.options.with_m as u8
    }

    /// ```text
    /// SELECT AddGeometryColumn('cities','geom',4326,'POLYGON',2)
    /// SELECT AddGeometryColumn('cities','geom',4326,'POLYGON',2);ALTER TABLE cities ALTER geom SET NOT NULL
    /// ```
    pub fn to_sql(&self, table: &str, unknown_srid: i32) -> String {
        let mut sql = format!(
            "SELECT AddGeometryColumn({},{},{},{},{})",
            quote_string(table),
            quote_string(&self.name),
            self.options.srid.unwrap_or(unknown_srid),
            quote_string(&self.ddl_type_name()),
            self.dimension()
        );
        if !self.options.null {
            sql.push_str(&format!(
                ";ALTER TABLE {} ALTER {} SET NOT NULL",
                identifier(table),
                identifier(&self.name)
            ));
        }
        sql
    }
}

/// Column layout collected inside a `create_table` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    name: String,
    primary_key: Option<String>,
    columns: Vec<ColumnDefinition>,
    geometry_columns: Vec<GeometryColumnDefinition>,
}

macro_rules! geometry_column_methods {
    ($($method:ident => $ty:ident),* $(,)?) => {
        impl TableDefinition {
            $(
                #[doc = concat!("Adds a `", stringify!($ty), "` geometry column.")]
                pub fn $method(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
                    self.geometry(name, GeometryType::$ty, options)
                }
            )*
        }
    };
}

geometry_column_methods! {
    point => Point,
    line_string => LineString,
    polygon => Polygon,
    multi_point => MultiPoint,
    multi_line_string => MultiLineString,
    multi_polygon => MultiPolygon,
    geometry_collection => GeometryCollection,
    any_geometry => Geometry,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, primary_key: Option<String>) -> Self {
        TableDefinition {
            name: name.into(),
            primary_key,
            columns: Vec::new(),
            geometry_columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn geometry_columns(&self) -> &[GeometryColumnDefinition] {
        &self.geometry_columns
    }

    /// Adds a column of an arbitrary SQL type.
    pub fn column(&mut self, name: &str, sql_type: &str) -> &mut Self {
        self.columns.push(ColumnDefinition {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            null: true,
            default: None,
        });
        self
    }

    /// Adds a column with a NOT NULL constraint and an optional default
    /// expression.
    pub fn required_column(&mut self, name: &str, sql_type: &str, default: Option<&str>) -> &mut Self {
        self.columns.push(ColumnDefinition {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            null: false,
            default: default.map(str::to_string),
        });
        self
    }

    pub fn string(&mut self, name: &str) -> &mut Self {
        self.column(name, "character varying(255)")
    }

    pub fn text(&mut self, name: &str) -> &mut Self {
        self.column(name, "text")
    }

    pub fn integer(&mut self, name: &str) -> &mut Self {
        self.column(name, "integer")
    }

    pub fn float(&mut self, name: &str) -> &mut Self {
        self.column(name, "double precision")
    }

    pub fn boolean(&mut self, name: &str) -> &mut Self {
        self.column(name, "boolean")
    }

    pub fn timestamp(&mut self, name: &str) -> &mut Self {
        self.column(name, "timestamp")
    }

    /// Adds a geometry column of any declared type.
    pub fn geometry(&mut self, name: &str, geometry_type: GeometryType, options: ColumnOptions) -> &mut Self {
        self.geometry_columns
            .push(GeometryColumnDefinition::new(name, geometry_type, options));
        self
    }

    /// The `CREATE TABLE` statement holding the plain columns.
    pub fn create_table_sql(&self) -> String {
        let mut parts = Vec::with_capacity(self.columns.len() + 1);
        if let Some(pk) = &self.primary_key {
            parts.push(format!("{} serial primary key", identifier(pk)));
        }
        parts.extend(self.columns.iter().map(ColumnDefinition::to_sql));
        format!("CREATE TABLE {} ({})", identifier(&self.name), parts.join(", "))
    }

    /// One `AddGeometryColumn` statement per geometry column.
    pub fn geometry_column_sql(&self, unknown_srid: i32) -> Vec<String> {
        self.geometry_columns
            .iter()
            .map(|column| column.to_sql(&self.name, unknown_srid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_geometry_column_sql() {
        let column = GeometryColumnDefinition::new(
            "geom",
            GeometryType::Polygon,
            ColumnOptions::new().srid(123),
        );
        assert_eq!(
            column.to_sql("cities", -1),
            "SELECT AddGeometryColumn('cities','geom',123,'POLYGON',2)"
        );
    }

    #[test]
    fn test_measured_column_sql() {
        let column = GeometryColumnDefinition::new(
            "geom",
            GeometryType::Point,
            ColumnOptions::new().srid(4326).with_m(),
        );
        assert_eq!(
            column.to_sql("positions", -1),
            "SELECT AddGeometryColumn('positions','geom',4326,'POINTM',3)"
        );
    }

    #[test]
    fn test_zm_column_sql() {
        let column = GeometryColumnDefinition::new(
            "geom",
            GeometryType::LineString,
            ColumnOptions::new().with_z().with_m(),
        );
        assert_eq!(
            column.to_sql("streets", -1),
            "SELECT AddGeometryColumn('streets','geom',-1,'LINESTRING',4)"
        );
    }

    #[test]
    fn test_not_null_column_sql() {
        let column = GeometryColumnDefinition::new(
            "the_geom",
            GeometryType::Point,
            ColumnOptions::new().srid(4326).not_null(),
        );
        assert_eq!(
            column.to_sql("diff_names", -1),
            "SELECT AddGeometryColumn('diff_names','the_geom',4326,'POINT',2);ALTER TABLE diff_names ALTER the_geom SET NOT NULL"
        );
    }

    #[test]
    fn test_create_table_sql() {
        let mut table = TableDefinition::new("cities", Some("id".to_string()));
        table
            .string("data")
            .integer("value")
            .required_column("visible", "boolean", Some("true"))
            .polygon("geom", ColumnOptions::new().srid(123));

        assert_eq!(
            table.create_table_sql(),
            "CREATE TABLE cities (id serial primary key, data character varying(255), value integer, visible boolean DEFAULT true NOT NULL)"
        );
        assert_eq!(
            table.geometry_column_sql(-1),
            vec!["SELECT AddGeometryColumn('cities','geom',123,'POLYGON',2)".to_string()]
        );
    }

    #[test]
    fn test_generated_geometry_methods() {
        let mut table = TableDefinition::new("shapes", None);
        table
            .point("a", ColumnOptions::new())
            .line_string("b", ColumnOptions::new())
            .polygon("c", ColumnOptions::new())
            .multi_point("d", ColumnOptions::new())
            .multi_line_string("e", ColumnOptions::new())
            .multi_polygon("f", ColumnOptions::new())
            .geometry_collection("g", ColumnOptions::new())
            .any_geometry("h", ColumnOptions::new());

        let types: Vec<GeometryType> = table
            .geometry_columns()
            .iter()
            .map(|c| c.geometry_type)
            .collect();
        assert_eq!(
            types,
            vec![
                GeometryType::Point,
                GeometryType::LineString,
                GeometryType::Polygon,
                GeometryType::MultiPoint,
                GeometryType::MultiLineString,
                GeometryType::MultiPolygon,
                GeometryType::GeometryCollection,
                GeometryType::Geometry,
            ]
        );
        assert_eq!(table.create_table_sql(), "CREATE TABLE shapes ()");
    }
}
