use crate::config::SpatialConfig;
use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};
use crate::registry::GeomRegistry;
use crate::sql::identifier;

use super::catalog::{self, IndexDefinition};
use super::{Column, ColumnOptions, GeometryColumnDefinition, GeometryType, TableDefinition};

/// Options for [`SchemaStatements::create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    /// Drop an existing table of the same name first.
    pub force: bool,
    /// Add a serial primary key column.
    pub id: bool,
    /// Name of the primary key column, the configured default when `None`.
    pub primary_key: Option<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            force: false,
            id: true,
            primary_key: None,
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn without_id(mut self) -> Self {
        self.id = false;
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }
}

/// Options for [`SchemaStatements::add_index`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub name: Option<String>,
    /// Build a GiST index instead of the default B-tree.
    pub spatial: bool,
    pub unique: bool,
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn spatial(mut self) -> Self {
        self.spatial = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// The schema-migration surface: DDL with geometry column support plus
/// introspection.
///
/// Every statement that changes a table drops the registry's cached
/// descriptors for it.
pub struct SchemaStatements<'a, C: ?Sized> {
    connection: &'a C,
    config: &'a SpatialConfig,
    registry: Option<&'a GeomRegistry>,
}

impl<'a, C: SpatialConnection + ?Sized> SchemaStatements<'a, C> {
    pub fn new(connection: &'a C, config: &'a SpatialConfig) -> Self {
        SchemaStatements {
            connection,
            config,
            registry: None,
        }
    }

    pub fn with_registry(mut self, registry: &'a GeomRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Creates `name` with the columns `define` adds, then registers every
    /// geometry column with `AddGeometryColumn`.
    ///
    /// ```rust,ignore
    /// schema.create_table("cities", TableOptions::new().force(), |t| {
    ///     t.string("data").polygon("geom", ColumnOptions::new().srid(123));
    /// })?;
    /// ```
    pub fn create_table<F>(&self, name: &str, options: TableOptions, define: F) -> SpatialResult<()>
    where
        F: FnOnce(&mut TableDefinition),
    {
        let primary_key = options.id.then(|| {
            options
                .primary_key
                .clone()
                .unwrap_or_else(|| self.config.primary_key().to_string())
        });

        let mut table = TableDefinition::new(name, primary_key);
        define(&mut table);

        if options.force {
            self.run(&format!("DROP TABLE IF EXISTS {} CASCADE", identifier(name)), name)?;
        }
        self.run(&table.create_table_sql(), name)?;
        for sql in table.geometry_column_sql(self.config.unknown_srid()) {
            self.run(&sql, name)?;
        }
        Ok(())
    }

    pub fn drop_table(&self, name: &str) -> SpatialResult<()> {
        self.run(&format!("DROP TABLE {}", identifier(name)), name)
    }

    pub fn add_column(&self, table: &str, name: &str, sql_type: &str) -> SpatialResult<()> {
        self.run(
            &format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                identifier(table),
                identifier(name),
                sql_type
            ),
            table,
        )
    }

    pub fn add_geometry_column(
        &self,
        table: &str,
        name: &str,
        geometry_type: GeometryType,
        options: ColumnOptions,
    ) -> SpatialResult<()> {
        let column = GeometryColumnDefinition::new(name, geometry_type, options);
        self.run(&column.to_sql(table, self.config.unknown_srid()), table)
    }

    /// Removes a column, through `DropGeometryColumn` when it is a geometry
    /// column so the catalog stays consistent.
    pub fn remove_column(&self, table: &str, name: &str) -> SpatialResult<()> {
        let columns = self.columns(table)?;
        let column = columns.iter().find(|c| c.name == name).ok_or_else(|| {
            log::error!("Column {} not found on {}", name, table);
            SpatialError::Schema(format!("column '{}' does not exist on '{}'", name, table))
        })?;

        let sql = if column.is_spatial() {
            format!(
                "SELECT DropGeometryColumn({},{})",
                self.connection.quote_string(table),
                self.connection.quote_string(name)
            )
        } else {
            format!(
                "ALTER TABLE {} DROP COLUMN {}",
                identifier(table),
                identifier(name)
            )
        };
        self.run(&sql, table)
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Adds an index over `columns`. Unnamed indexes are called
    /// `index_<table>_on_<a>_and_<b>`.
    pub fn add_index(&self, table: &str, columns: &[&str], options: IndexOptions) -> SpatialResult<()> {
        if columns.is_empty() {
            log::error!("Index on {} needs at least one column", table);
            return Err(SpatialError::Schema(format!(
                "index on '{}' needs at least one column",
                table
            )));
        }

        let name = options
            .name
            .clone()
            .unwrap_or_else(|| index_name(table, columns));
        let column_list = columns.iter().map(|c| identifier(c)).collect::<Vec<_>>().join(", ");

        let sql = format!(
            "CREATE {}INDEX {} ON {}{} ({})",
            if options.unique { "UNIQUE " } else { "" },
            identifier(&name),
            identifier(table),
            if options.spatial { " USING GIST" } else { "" },
            column_list
        );
        self.run(&sql, table)
    }

    pub fn remove_index(&self, table: &str, name: &str) -> SpatialResult<()> {
        self.run(&format!("DROP INDEX {}", identifier(name)), table)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn indexes(&self, table: &str) -> SpatialResult<Vec<IndexDefinition>> {
        catalog::indexes(self.connection, table)
    }

    pub fn columns(&self, table: &str) -> SpatialResult<Vec<Column>> {
        catalog::columns(self.connection, table)
    }

    pub fn tables(&self) -> SpatialResult<Vec<String>> {
        catalog::tables(self.connection)
    }

    pub fn table_exists(&self, table: &str) -> SpatialResult<bool> {
        Ok(self.tables()?.iter().any(|t| t == table))
    }

    fn run(&self, sql: &str, table: &str) -> SpatialResult<()> {
        log::info!("{}", sql);
        let result = self.connection.execute(sql);

        if let Some(registry) = self.registry {
            registry.invalidate(table);
        }

        result.map(|_| ()).map_err(|err| {
            log::error!("Schema statement failed: {}", err);
            SpatialError::Schema(err.message().to_string())
        })
    }
}

/// The default name of an index over `columns`.
pub fn index_name(table: &str, columns: &[&str]) -> String {
    format!("index_{}_on_{}", table, columns.join("_and_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingConnection;

    fn schema<'a>(conn: &'a RecordingConnection, config: &'a SpatialConfig) -> SchemaStatements<'a, RecordingConnection> {
        SchemaStatements::new(conn, config)
    }

    #[test]
    fn test_create_table_with_geometry_columns() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();

        schema(&conn, &config)
            .create_table("cities", TableOptions::new().force(), |t| {
                t.string("data")
                    .integer("value")
                    .polygon("geom", ColumnOptions::new().srid(123).not_null());
            })
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "DROP TABLE IF EXISTS cities CASCADE".to_string(),
                "CREATE TABLE cities (id serial primary key, data character varying(255), value integer)".to_string(),
                "SELECT AddGeometryColumn('cities','geom',123,'POLYGON',2);ALTER TABLE cities ALTER geom SET NOT NULL"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_create_table_without_id_uses_unknown_srid() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();

        schema(&conn, &config)
            .create_table("tracks", TableOptions::new().without_id(), |t| {
                t.line_string("geom", ColumnOptions::new().with_z().with_m());
            })
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "CREATE TABLE tracks ()".to_string(),
                "SELECT AddGeometryColumn('tracks','geom',-1,'LINESTRING',4)".to_string(),
            ]
        );
    }

    #[test]
    fn test_custom_primary_key() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();

        schema(&conn, &config)
            .create_table("diff_names", TableOptions::new().primary_key("code"), |t| {
                t.point("the_geom", ColumnOptions::new().srid(4326));
            })
            .unwrap();
        assert_eq!(
            conn.statements()[0],
            "CREATE TABLE diff_names (code serial primary key)"
        );
    }

    #[test]
    fn test_add_columns() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        let schema = schema(&conn, &config);

        schema.add_column("cities", "name", "text").unwrap();
        schema
            .add_geometry_column(
                "cities",
                "center",
                GeometryType::Point,
                ColumnOptions::new().srid(4326).with_m(),
            )
            .unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "ALTER TABLE cities ADD COLUMN name text".to_string(),
                "SELECT AddGeometryColumn('cities','center',4326,'POINTM',3)".to_string(),
            ]
        );
    }

    fn column_rows(conn: &RecordingConnection) {
        conn.push_rows(
            &["attname", "sql_type", "column_default", "attnotnull"],
            vec![
                vec![Some("data"), Some("text"), None, Some("f")],
                vec![Some("geom"), Some("geometry(Point,4326)"), None, Some("f")],
            ],
        );
        conn.push_rows(
            &["f_geometry_column", "coord_dimension", "srid", "type"],
            vec![vec![Some("geom"), Some("2"), Some("4326"), Some("POINT")]],
        );
    }

    #[test]
    fn test_remove_geometry_column() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        column_rows(&conn);

        schema(&conn, &config).remove_column("places", "geom").unwrap();
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT DropGeometryColumn('places','geom')"
        );
    }

    #[test]
    fn test_remove_plain_column() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        column_rows(&conn);

        schema(&conn, &config).remove_column("places", "data").unwrap();
        assert_eq!(
            conn.last_statement().unwrap(),
            "ALTER TABLE places DROP COLUMN data"
        );
    }

    #[test]
    fn test_remove_missing_column() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        column_rows(&conn);

        let err = schema(&conn, &config).remove_column("places", "nope").unwrap_err();
        assert!(matches!(err, SpatialError::Schema(_)));
    }

    #[test]
    fn test_add_index() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        let schema = schema(&conn, &config);

        schema.add_index("cities", &["geom"], IndexOptions::new().spatial()).unwrap();
        schema
            .add_index("cities", &["data", "value"], IndexOptions::new().unique())
            .unwrap();
        schema
            .add_index("cities", &["geom"], IndexOptions::new().name("cities_geom_idx").spatial())
            .unwrap();
        schema.remove_index("cities", "cities_geom_idx").unwrap();

        assert_eq!(
            conn.statements(),
            vec![
                "CREATE INDEX index_cities_on_geom ON cities USING GIST (geom)".to_string(),
                "CREATE UNIQUE INDEX index_cities_on_data_and_value ON cities (data, value)".to_string(),
                "CREATE INDEX cities_geom_idx ON cities USING GIST (geom)".to_string(),
                "DROP INDEX cities_geom_idx".to_string(),
            ]
        );
    }

    #[test]
    fn test_index_without_columns_fails() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        let err = schema(&conn, &config)
            .add_index("cities", &[], IndexOptions::new())
            .unwrap_err();
        assert!(matches!(err, SpatialError::Schema(_)));
        assert!(conn.statements().is_empty());
    }

    #[test]
    fn test_failed_ddl_is_schema_error() {
        let conn = RecordingConnection::new();
        conn.push_execute_error(SpatialError::Database("relation \"cities\" already exists".into()));
        let config = SpatialConfig::default();

        let err = schema(&conn, &config)
            .create_table("cities", TableOptions::new(), |_| {})
            .unwrap_err();
        assert_eq!(err, SpatialError::Schema("relation \"cities\" already exists".into()));
    }

    #[test]
    fn test_ddl_invalidates_registry() {
        let conn = RecordingConnection::new();
        let config = SpatialConfig::default();
        let registry = GeomRegistry::new();

        conn.push_rows(
            &["f_geometry_column", "coord_dimension", "srid", "type"],
            vec![vec![Some("geom"), Some("2"), Some("4326"), Some("POINT")]],
        );
        assert_eq!(registry.geometry_type(&conn, "places", "geom"), GeometryType::Point);

        SchemaStatements::new(&conn, &config)
            .with_registry(&registry)
            .drop_table("places")
            .unwrap();

        assert_eq!(registry.geometry_type(&conn, "places", "geom"), GeometryType::Unknown);
    }

    #[test]
    fn test_table_exists() {
        let conn = RecordingConnection::new();
        conn.push_rows(&["tablename"], vec![vec![Some("cities")]]);
        let config = SpatialConfig::default();
        assert!(schema(&conn, &config).table_exists("cities").unwrap());
    }
}
